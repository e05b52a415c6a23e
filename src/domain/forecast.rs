use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One discrete weather prediction for a future instant.
///
/// Samples arrive from the forecast provider in ascending timestamp order,
/// usually three hours apart. A sample is never modified after it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0..=100
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
}

impl ForecastSample {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            pressure,
        }
    }

    /// Absolute distance between this sample and `target`, in milliseconds.
    pub fn distance_ms(&self, target: DateTime<Utc>) -> i64 {
        (self.timestamp - target).num_milliseconds().abs()
    }
}
