use crate::domain::ml::feature_registry::{FeatureScaling, FeatureVector};

/// Interface for the pre-trained availability model.
///
/// Loaded once at startup and shared read-only across requests, so
/// `predict` must not keep mutable state between calls.
pub trait AvailabilityModel: Send + Sync {
    /// Raw (unbounded) predicted bike count
    fn predict(&self, features: &FeatureVector) -> Result<f64, String>;

    /// Feature convention the artifact was trained with
    fn feature_scaling(&self) -> FeatureScaling {
        FeatureScaling::Raw
    }

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}
