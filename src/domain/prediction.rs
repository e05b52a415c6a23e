use crate::domain::errors::ValidationError;
use crate::domain::forecast::ForecastSample;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw prediction parameters exactly as the route layer receives them
/// (`/predict?date=YYYY-MM-DD&time=HH:MM[:SS]&station_id=N`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionQuery {
    pub station_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl PredictionQuery {
    pub fn new(station_id: &str, date: &str, time: &str) -> Self {
        Self {
            station_id: Some(station_id.to_string()),
            date: Some(date.to_string()),
            time: Some(time.to_string()),
        }
    }

    /// Parse into a typed request. Date and time are local to `tz`.
    pub fn parse(&self, tz: Tz) -> Result<PredictionRequest, ValidationError> {
        let station_raw = required("station_id", &self.station_id)?;
        let date_raw = required("date", &self.date)?;
        let time_raw = required("time", &self.time)?;

        let station_id = parse_station_id(station_raw)?;

        let date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidTimestamp {
                value: date_raw.to_string(),
            }
        })?;
        let time = NaiveTime::parse_from_str(time_raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time_raw, "%H:%M"))
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: time_raw.to_string(),
            })?;

        // DST fall-back resolves to the earlier instant; the spring-forward gap has none.
        let local = date.and_time(time);
        let target = tz
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: format!("{} {}", date_raw, time_raw),
            })?
            .with_timezone(&Utc);

        Ok(PredictionRequest::new(station_id, target))
    }
}

fn required<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter { name }),
    }
}

fn parse_station_id(raw: &str) -> Result<u32, ValidationError> {
    let id = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::NonNumericStationId {
            value: raw.to_string(),
        })?;
    u32::try_from(id).map_err(|_| ValidationError::UnknownStation { station_id: id })
}

/// A validated-shape prediction request. Catalog membership and the
/// future-only rule are checked by the service against its own clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub station_id: u32,
    pub target_instant: DateTime<Utc>,
    /// Replaces the forecast source for this request only
    pub forecast_override: Option<Vec<ForecastSample>>,
}

impl PredictionRequest {
    pub fn new(station_id: u32, target_instant: DateTime<Utc>) -> Self {
        Self {
            station_id,
            target_instant,
            forecast_override: None,
        }
    }

    pub fn with_forecast(mut self, samples: Vec<ForecastSample>) -> Self {
        self.forecast_override = Some(samples);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub station_id: u32,
    pub target_instant: DateTime<Utc>,
    /// Always within `0..=capacity`
    pub predicted_bikes: u32,
    /// True when a scaled feature fell outside the model's training domain
    pub extrapolated: bool,
}

/// How a raw model output becomes a bike count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundMode {
    #[default]
    Clamp,
    /// Unverified calibration carried over from one model variant
    SigmoidRenormalize,
}

impl FromStr for BoundMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clamp" => Ok(BoundMode::Clamp),
            "sigmoid" | "sigmoid_renormalize" => Ok(BoundMode::SigmoidRenormalize),
            _ => anyhow::bail!(
                "Invalid PREDICTION_BOUND_MODE: {}. Must be 'clamp' or 'sigmoid'",
                s
            ),
        }
    }
}

/// States of a single prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStage {
    Validate,
    MatchForecast,
    BuildFeatures,
    Invoke,
    /// Terminal success state. Bounding cannot fail, so this is only ever
    /// reached, never reported by a `PipelineError`.
    Bound,
}

impl fmt::Display for PredictionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PredictionStage::Validate => "validate",
            PredictionStage::MatchForecast => "match_forecast",
            PredictionStage::BuildFeatures => "build_features",
            PredictionStage::Invoke => "invoke",
            PredictionStage::Bound => "bound",
        };
        f.write_str(name)
    }
}
