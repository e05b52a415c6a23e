//! Repository Pattern Abstractions
//!
//! Persistent storage for station reference data and availability
//! observations. The pipeline never talks to these directly: the binary (or a
//! poller) loads their contents into the in-memory collaborators.

use crate::domain::station::StationProfile;
use crate::domain::usage::HistoricalRecord;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// One availability reading as scraped from the bike-share feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityObservation {
    pub station_id: u32,
    pub observed_at: DateTime<Utc>,
    pub available_bikes: u32,
    pub available_bike_stands: u32,
}

#[async_trait]
pub trait StationRepository: Send + Sync {
    /// Insert or update a station
    async fn save(&self, station: &StationProfile) -> Result<()>;

    async fn find_by_id(&self, station_id: u32) -> Result<Option<StationProfile>>;

    async fn get_all(&self) -> Result<Vec<StationProfile>>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn record(&self, observation: &AvailabilityObservation) -> Result<()>;

    /// All observations for a station, bucketed by local hour in `tz`
    async fn records_for_station(&self, station_id: u32, tz: Tz) -> Result<Vec<HistoricalRecord>>;

    async fn count(&self) -> Result<usize>;
}
