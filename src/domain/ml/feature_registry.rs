use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered list of feature names.
/// This order MUST match the column order the model was trained with.
/// Any change here is a breaking change for every model artifact.
pub const FEATURE_NAMES: &[&str] = &[
    "station_id",
    "temperature",
    "humidity",
    "pressure",
    "hour",
    "station_hour_key",
    "day_of_week",
];

/// Fixed min-max domains used at training time.
pub const TEMPERATURE_DOMAIN_C: (f64, f64) = (-5.0, 30.0);
pub const PRESSURE_DOMAIN_HPA: (f64, f64) = (980.0, 1030.0);
pub const HUMIDITY_MAX: f64 = 100.0;
pub const HOUR_MAX: f64 = 23.0;
pub const DAY_OF_WEEK_MAX: f64 = 6.0;

/// Numeric convention a model artifact was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureScaling {
    /// Features as measured: °C, %, hPa, hour 0-23, weekday 0-6
    #[default]
    Raw,
    /// Min-max scaled into [0,1] over the fixed training domains
    MinMax,
}

impl FromStr for FeatureScaling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(FeatureScaling::Raw),
            "minmax" | "min_max" => Ok(FeatureScaling::MinMax),
            _ => anyhow::bail!(
                "Invalid MODEL_FEATURE_SCALING: {}. Must be 'raw' or 'minmax'",
                s
            ),
        }
    }
}

/// Linear map of `value` from `[min, max]` onto `[0, 1]`. No clamping.
pub fn min_max(value: f64, (min, max): (f64, f64)) -> f64 {
    (value - min) / (max - min)
}

/// Station/hour interaction term, categorical for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationHourKey {
    pub station_id: u32,
    pub hour: u32,
}

impl StationHourKey {
    pub fn new(station_id: u32, hour: u32) -> Self {
        Self { station_id, hour }
    }

    /// Integer category code: one slot per (station, hour).
    pub fn ordinal(&self) -> u64 {
        self.station_id as u64 * 24 + self.hour as u64
    }
}

impl fmt::Display for StationHourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.station_id, self.hour)
    }
}

/// Model input, one field per entry of `FEATURE_NAMES`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub station_id: u32,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub hour: f64,
    pub station_hour_key: StationHourKey,
    pub day_of_week: f64,
    pub scaling: FeatureScaling,
}

impl FeatureVector {
    /// Flatten in `FEATURE_NAMES` order (f64, for tree models).
    pub fn to_model_input(&self) -> Vec<f64> {
        vec![
            self.station_id as f64,
            self.temperature,
            self.humidity,
            self.pressure,
            self.hour,
            self.station_hour_key.ordinal() as f64,
            self.day_of_week,
        ]
    }

    /// Same as `to_model_input` narrowed to f32 for ONNX inference.
    pub fn to_f32_input(&self) -> Vec<f32> {
        self.to_model_input().into_iter().map(|v| v as f32).collect()
    }

    /// Scaled fields that landed outside [0,1]. Always empty for raw features.
    pub fn out_of_domain_fields(&self) -> Vec<&'static str> {
        if self.scaling == FeatureScaling::Raw {
            return Vec::new();
        }

        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("pressure", self.pressure),
            ("hour", self.hour),
            ("day_of_week", self.day_of_week),
        ]
        .into_iter()
        .filter(|(_, v)| !(0.0..=1.0).contains(v))
        .map(|(name, _)| name)
        .collect()
    }
}
