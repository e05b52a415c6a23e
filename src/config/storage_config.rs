//! Storage configuration parsing from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    pub database_url: String,
    pub station_cache_capacity: usize,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/bikes.db".to_string(),
            station_cache_capacity: 512,
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            station_cache_capacity: env::var("STATION_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.station_cache_capacity),
        }
    }
}
