use super::predictor::AvailabilityModel;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureScaling, FeatureVector};
use anyhow::{Context, Result};
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// ONNX Runtime model taking a single `[1, 7]` f32 row.
///
/// The session is serialized behind a mutex; it holds no per-request state.
pub struct OnnxPredictor {
    session: Mutex<Session>,
    model_path: PathBuf,
    scaling: FeatureScaling,
}

impl OnnxPredictor {
    pub fn load(model_path: impl AsRef<Path>, scaling: FeatureScaling) -> Result<Self> {
        let model_path = model_path.as_ref().to_path_buf();
        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found at {:?}", model_path);
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model {:?}", model_path))?;

        info!("Successfully loaded ONNX model from {:?}", model_path);
        Ok(Self {
            session: Mutex::new(session),
            model_path,
            scaling,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl AvailabilityModel for OnnxPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, String> {
        let input = features.to_f32_input();
        let shape = vec![1, FEATURE_NAMES.len()];

        let input_value = ort::value::Value::from_array((shape.as_slice(), input))
            .map_err(|e| format!("Input value creation failed: {}", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Session lock failed: {}", e))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| e.to_string())?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or("No output found")?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| e.to_string())?;
        Ok(*data.1.iter().next().ok_or("Empty output")? as f64)
    }

    fn feature_scaling(&self) -> FeatureScaling {
        self.scaling
    }

    fn name(&self) -> &str {
        "ONNX Runtime"
    }

    fn version(&self) -> &str {
        "v1.0"
    }
}
