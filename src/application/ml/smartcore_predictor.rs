use super::predictor::AvailabilityModel;
use crate::domain::ml::feature_registry::{FeatureScaling, FeatureVector};
use anyhow::{Context, Result};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub struct SmartCorePredictor {
    model: Forest,
    model_path: PathBuf,
    scaling: FeatureScaling,
}

impl SmartCorePredictor {
    /// Load a serde_json-serialized random forest.
    ///
    /// A missing or unreadable artifact is an error: there is no neutral
    /// fallback output for a bike count.
    pub fn load(model_path: impl AsRef<Path>, scaling: FeatureScaling) -> Result<Self> {
        let model_path = model_path.as_ref().to_path_buf();
        let file = File::open(&model_path)
            .with_context(|| format!("Failed to open model file {:?}", model_path))?;

        let model: Forest = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to deserialize model {:?}", model_path))?;

        info!(
            "Loaded random forest model from {:?} (scaling {:?})",
            model_path, scaling
        );
        Ok(Self::from_model(model, model_path, scaling))
    }

    pub fn from_model(model: Forest, model_path: PathBuf, scaling: FeatureScaling) -> Self {
        Self {
            model,
            model_path,
            scaling,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl AvailabilityModel for SmartCorePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, String> {
        let input_matrix = DenseMatrix::from_2d_vec(&vec![features.to_model_input()])
            .map_err(|e| format!("Matrix creation failed: {}", e))?;

        let predictions = self
            .model
            .predict(&input_matrix)
            .map_err(|e| format!("Prediction failed: {}", e))?;

        predictions
            .first()
            .copied()
            .ok_or_else(|| "No prediction returned".to_string())
    }

    fn feature_scaling(&self) -> FeatureScaling {
        self.scaling
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }

    fn version(&self) -> &str {
        "v1.0"
    }
}
