pub mod feature_builder;
pub mod prediction_bounder;
pub mod prediction_service;
pub mod time_series_matcher;

pub use feature_builder::FeatureBuilder;
pub use prediction_bounder::PredictionBounder;
pub use prediction_service::{PipelineSettings, PredictionService};
