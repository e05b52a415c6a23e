use crate::domain::prediction::PredictionStage;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Bad, missing or out-of-range request parameters. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing parameter: {name}")]
    MissingParameter { name: &'static str },

    #[error("Station id is not numeric: {value}")]
    NonNumericStationId { value: String },

    #[error("Invalid date/time: {value}")]
    InvalidTimestamp { value: String },

    #[error("Unknown station: {station_id}")]
    UnknownStation { station_id: i64 },

    #[error("past time: {target} is not after {now}")]
    PastTime {
        target: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("Invalid weekday: {value} (Monday = 0 .. Sunday = 6)")]
    InvalidWeekday { value: u8 },
}

/// No forecast sample could be matched to the target instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("No forecast sample available")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("Invalid feature input: {field} is missing or not finite")]
    InvalidInput { field: &'static str },
}

/// Failure reported by an external collaborator (forecast source, history store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{upstream} unavailable: {reason}")]
pub struct UpstreamError {
    pub upstream: &'static str,
    pub reason: String,
}

impl UpstreamError {
    pub fn new(upstream: &'static str, reason: impl Into<String>) -> Self {
        Self {
            upstream,
            reason: reason.into(),
        }
    }
}

/// Terminal `Failed(reason)` state of the prediction pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{upstream} unavailable: {reason}")]
    UpstreamUnavailable {
        upstream: &'static str,
        reason: String,
    },

    #[error(transparent)]
    InvalidFeatures(#[from] FeatureError),

    #[error("Model {model} failed: {reason}")]
    ModelInvocation { model: String, reason: String },
}

impl PipelineError {
    pub fn forecast_unavailable(reason: impl Into<String>) -> Self {
        PipelineError::UpstreamUnavailable {
            upstream: "forecast",
            reason: reason.into(),
        }
    }

    /// The state the request was in when it failed. Bounding is total, so
    /// no failure ever reports `PredictionStage::Bound`.
    pub fn stage(&self) -> PredictionStage {
        match self {
            PipelineError::Validation(_) => PredictionStage::Validate,
            PipelineError::UpstreamUnavailable { .. } => PredictionStage::MatchForecast,
            PipelineError::InvalidFeatures(_) => PredictionStage::BuildFeatures,
            PipelineError::ModelInvocation { .. } => PredictionStage::Invoke,
        }
    }

    /// Short label used for metrics and logs.
    pub fn reason_label(&self) -> &'static str {
        match self {
            PipelineError::Validation(ValidationError::MissingParameter { .. }) => "missing_parameter",
            PipelineError::Validation(ValidationError::NonNumericStationId { .. }) => "non_numeric_station",
            PipelineError::Validation(ValidationError::InvalidTimestamp { .. }) => "invalid_timestamp",
            PipelineError::Validation(ValidationError::UnknownStation { .. }) => "unknown_station",
            PipelineError::Validation(ValidationError::PastTime { .. }) => "past_time",
            PipelineError::Validation(ValidationError::InvalidWeekday { .. }) => "invalid_weekday",
            PipelineError::UpstreamUnavailable { .. } => "upstream_unavailable",
            PipelineError::InvalidFeatures(_) => "invalid_features",
            PipelineError::ModelInvocation { .. } => "model_invocation",
        }
    }
}

impl From<UpstreamError> for PipelineError {
    fn from(err: UpstreamError) -> Self {
        PipelineError::UpstreamUnavailable {
            upstream: err.upstream,
            reason: err.reason,
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(_: MatchError) -> Self {
        PipelineError::forecast_unavailable("no forecast sample available")
    }
}
