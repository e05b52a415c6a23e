//! Weather provider configuration parsing from environment variables.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WeatherEnvConfig {
    pub api_key: String,
    pub base_url: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub http_timeout_secs: u64,
}

impl Default for WeatherEnvConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5/forecast".to_string(),
            cache_ttl_secs: 600,
            cache_capacity: 64,
            http_timeout_secs: 30,
        }
    }
}

impl WeatherEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            base_url: env::var("OPENWEATHER_BASE_URL").unwrap_or(defaults.base_url),
            cache_ttl_secs: env::var("WEATHER_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            cache_capacity: env::var("WEATHER_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.cache_capacity),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.http_timeout_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
