//! Test doubles for the pipeline's collaborators.

use crate::application::ml::predictor::AvailabilityModel;
use crate::domain::errors::UpstreamError;
use crate::domain::forecast::ForecastSample;
use crate::domain::ml::feature_registry::{FeatureScaling, FeatureVector};
use crate::domain::ports::{Clock, ForecastSource};
use crate::domain::station::Coordinates;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Clock pinned to a settable instant.
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|p| p.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|p| p.into_inner())
    }
}

/// Model returning a canned output and remembering what it was asked.
pub struct StubModel {
    output: Result<f64, String>,
    scaling: FeatureScaling,
    calls: AtomicUsize,
    last: Mutex<Option<FeatureVector>>,
}

impl StubModel {
    pub fn returning(value: f64) -> Self {
        Self::with_output(Ok(value))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_output(Err(reason.to_string()))
    }

    fn with_output(output: Result<f64, String>) -> Self {
        Self {
            output,
            scaling: FeatureScaling::Raw,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn with_scaling(mut self, scaling: FeatureScaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_features(&self) -> Option<FeatureVector> {
        self.last.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl AvailabilityModel for StubModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = Some(features.clone());
        self.output.clone()
    }

    fn feature_scaling(&self) -> FeatureScaling {
        self.scaling
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn version(&self) -> &str {
        "0.0.0"
    }
}

/// Forecast source that counts lookups.
pub struct CountingForecastSource {
    samples: Result<Vec<ForecastSample>, String>,
    calls: Arc<AtomicUsize>,
}

impl CountingForecastSource {
    pub fn new(samples: Vec<ForecastSample>) -> Self {
        Self {
            samples: Ok(samples),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            samples: Err(reason.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter, still readable after the source is moved into a service.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl ForecastSource for CountingForecastSource {
    fn samples_for(&self, _coordinates: Coordinates) -> Result<Vec<ForecastSample>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.samples
            .clone()
            .map_err(|reason| UpstreamError::new("forecast", reason))
    }
}
