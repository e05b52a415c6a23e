//! Configuration module for bikecast.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: Prediction, Weather, and Storage.

mod prediction_config;
mod storage_config;
mod weather_config;

pub use prediction_config::{ModelBackend, PredictionEnvConfig};
pub use storage_config::StorageEnvConfig;
pub use weather_config::WeatherEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub prediction: PredictionEnvConfig,
    pub weather: WeatherEnvConfig,
    pub storage: StorageEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults; a set but invalid enum value is
    /// an error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        let prediction =
            PredictionEnvConfig::from_env().context("Failed to load prediction config")?;
        let weather = WeatherEnvConfig::from_env();
        let storage = StorageEnvConfig::from_env();

        Ok(Self {
            prediction,
            weather,
            storage,
        })
    }
}
