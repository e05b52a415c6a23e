//! Prediction pipeline configuration parsing from environment variables.

use crate::application::forecast::PipelineSettings;
use crate::application::forecast::prediction_bounder::DEFAULT_CAPACITY_CEILING;
use crate::domain::ml::feature_registry::FeatureScaling;
use crate::domain::prediction::BoundMode;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which runtime loads the model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelBackend {
    #[default]
    SmartCore,
    Onnx,
}

impl FromStr for ModelBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smartcore" => Ok(ModelBackend::SmartCore),
            "onnx" => Ok(ModelBackend::Onnx),
            _ => anyhow::bail!(
                "Invalid MODEL_BACKEND: {}. Must be 'smartcore' or 'onnx'",
                s
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictionEnvConfig {
    pub timezone: Tz,
    pub bound_mode: BoundMode,
    pub unknown_capacity_ceiling: u32,
    pub model_path: PathBuf,
    pub model_backend: ModelBackend,
    pub model_feature_scaling: FeatureScaling,
}

impl Default for PredictionEnvConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Dublin,
            bound_mode: BoundMode::Clamp,
            unknown_capacity_ceiling: DEFAULT_CAPACITY_CEILING,
            model_path: PathBuf::from("data/model/availability_model.json"),
            model_backend: ModelBackend::SmartCore,
            model_feature_scaling: FeatureScaling::Raw,
        }
    }
}

impl PredictionEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timezone = match env::var("SERVICE_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid SERVICE_TIMEZONE {}: {}", name, e))?,
            Err(_) => defaults.timezone,
        };

        let bound_mode = match env::var("PREDICTION_BOUND_MODE") {
            Ok(s) => BoundMode::from_str(&s).context("Invalid PREDICTION_BOUND_MODE")?,
            Err(_) => defaults.bound_mode,
        };

        let model_backend = match env::var("MODEL_BACKEND") {
            Ok(s) => ModelBackend::from_str(&s)?,
            Err(_) => defaults.model_backend,
        };

        let model_feature_scaling = match env::var("MODEL_FEATURE_SCALING") {
            Ok(s) => FeatureScaling::from_str(&s).context("Invalid MODEL_FEATURE_SCALING")?,
            Err(_) => defaults.model_feature_scaling,
        };

        Ok(Self {
            timezone,
            bound_mode,
            unknown_capacity_ceiling: env::var("UNKNOWN_CAPACITY_CEILING")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.unknown_capacity_ceiling),
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_backend,
            model_feature_scaling,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            timezone: self.timezone,
            bound_mode: self.bound_mode,
            unknown_capacity_ceiling: self.unknown_capacity_ceiling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_backend_parse() {
        assert_eq!(ModelBackend::from_str("ONNX").unwrap(), ModelBackend::Onnx);
        assert_eq!(
            ModelBackend::from_str("smartcore").unwrap(),
            ModelBackend::SmartCore
        );
        assert!(ModelBackend::from_str("xgboost").is_err());
    }

    #[test]
    fn test_settings_carry_over() {
        let config = PredictionEnvConfig {
            bound_mode: BoundMode::SigmoidRenormalize,
            unknown_capacity_ceiling: 30,
            ..Default::default()
        };
        let settings = config.pipeline_settings();
        assert_eq!(settings.bound_mode, BoundMode::SigmoidRenormalize);
        assert_eq!(settings.unknown_capacity_ceiling, 30);
        assert_eq!(settings.timezone, chrono_tz::Europe::Dublin);
    }
}
