//! Collaborator interfaces consumed by the prediction pipeline.
//!
//! All ports are synchronous: they serve data already fetched by an external
//! poller or held in memory. Network I/O lives behind these traits, never in
//! the pipeline itself.

use crate::domain::errors::UpstreamError;
use crate::domain::forecast::ForecastSample;
use crate::domain::station::{Coordinates, StationProfile};
use crate::domain::usage::HistoricalRecord;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Weather forecast lookup by location.
pub trait ForecastSource: Send + Sync {
    /// Ascending sequence of samples covering the provider's horizon.
    fn samples_for(&self, coordinates: Coordinates) -> Result<Vec<ForecastSample>, UpstreamError>;
}

impl<T: ForecastSource + ?Sized> ForecastSource for Arc<T> {
    fn samples_for(&self, coordinates: Coordinates) -> Result<Vec<ForecastSample>, UpstreamError> {
        (**self).samples_for(coordinates)
    }
}

/// Station reference data.
pub trait StationCatalog: Send + Sync {
    fn station(&self, station_id: u32) -> Option<StationProfile>;
}

/// Append-only availability log.
pub trait HistoricalUsageSource: Send + Sync {
    fn records_for(&self, station_id: u32) -> Result<Vec<HistoricalRecord>, UpstreamError>;
}

/// Source of "now" for request validation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
