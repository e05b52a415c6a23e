//! In-Memory Implementations
//!
//! Thread-safe holders for data the pipeline reads synchronously. A loader
//! (the CLI, a poller, or a test) fills them; request handlers only read.
//!
//! Locks are `std::sync::RwLock`: no lock is ever held across an await, and a
//! poisoned lock is recovered rather than propagated.

use crate::domain::errors::UpstreamError;
use crate::domain::forecast::ForecastSample;
use crate::domain::ports::{ForecastSource, HistoricalUsageSource, StationCatalog};
use crate::domain::repositories::StationRepository;
use crate::domain::station::{Coordinates, StationProfile};
use crate::domain::usage::HistoricalRecord;
use crate::infrastructure::openweather::OpenWeatherClient;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!("In-memory store: read lock poisoned, recovering");
        poisoned.into_inner()
    })
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!("In-memory store: write lock poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Station reference data keyed by station id.
#[derive(Default)]
pub struct InMemoryStationCatalog {
    stations: RwLock<HashMap<u32, StationProfile>>,
}

impl InMemoryStationCatalog {
    pub fn new(stations: Vec<StationProfile>) -> Self {
        Self {
            stations: RwLock::new(stations.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    pub fn upsert(&self, station: StationProfile) {
        write(&self.stations).insert(station.id, station);
    }

    pub fn len(&self) -> usize {
        read(&self.stations).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StationCatalog for InMemoryStationCatalog {
    fn station(&self, station_id: u32) -> Option<StationProfile> {
        read(&self.stations).get(&station_id).cloned()
    }
}

#[async_trait]
impl StationRepository for InMemoryStationCatalog {
    async fn save(&self, station: &StationProfile) -> Result<()> {
        self.upsert(station.clone());
        Ok(())
    }

    async fn find_by_id(&self, station_id: u32) -> Result<Option<StationProfile>> {
        Ok(self.station(station_id))
    }

    async fn get_all(&self) -> Result<Vec<StationProfile>> {
        let mut all: Vec<StationProfile> = read(&self.stations).values().cloned().collect();
        all.sort_by_key(|s| s.id);
        Ok(all)
    }
}

/// Outcome of the last forecast load per location. A failed load is kept so
/// the pipeline reports the provider's reason instead of a bare "not loaded".
#[derive(Default)]
pub struct ForecastSnapshot {
    samples: RwLock<HashMap<(i64, i64), Result<Vec<ForecastSample>, UpstreamError>>>,
}

impl ForecastSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the samples held for a location. Stored ascending.
    pub fn replace(&self, coordinates: Coordinates, mut samples: Vec<ForecastSample>) {
        samples.sort_by_key(|s| s.timestamp);
        write(&self.samples).insert(coordinates.cache_key(), Ok(samples));
    }

    /// Record that the forecast for a location could not be loaded.
    pub fn mark_unavailable(&self, coordinates: Coordinates, err: UpstreamError) {
        write(&self.samples).insert(coordinates.cache_key(), Err(err));
    }

    /// Await a forecast load and store its outcome. A failed load is stored as
    /// an `UpstreamError` and returned.
    pub async fn load_with<F>(
        &self,
        coordinates: Coordinates,
        fetch: F,
    ) -> std::result::Result<usize, UpstreamError>
    where
        F: Future<Output = Result<Vec<ForecastSample>>>,
    {
        match fetch.await {
            Ok(samples) => {
                let count = samples.len();
                self.replace(coordinates, samples);
                info!(
                    "ForecastSnapshot: {} samples loaded for ({:.4}, {:.4})",
                    count, coordinates.lat, coordinates.lng
                );
                Ok(count)
            }
            Err(e) => {
                let err = UpstreamError::new("forecast", format!("{:#}", e));
                warn!(
                    "ForecastSnapshot: load failed for ({:.4}, {:.4}): {}",
                    coordinates.lat, coordinates.lng, err.reason
                );
                self.mark_unavailable(coordinates, err.clone());
                Err(err)
            }
        }
    }

    /// Fetch a fresh forecast for a location and swap it in.
    pub async fn refresh(
        &self,
        client: &OpenWeatherClient,
        coordinates: Coordinates,
    ) -> std::result::Result<usize, UpstreamError> {
        self.load_with(coordinates, client.fetch_forecast(coordinates))
            .await
    }
}

impl ForecastSource for ForecastSnapshot {
    fn samples_for(&self, coordinates: Coordinates) -> Result<Vec<ForecastSample>, UpstreamError> {
        read(&self.samples)
            .get(&coordinates.cache_key())
            .cloned()
            .unwrap_or_else(|| {
                Err(UpstreamError::new(
                    "forecast",
                    format!(
                        "no forecast loaded for ({:.4}, {:.4})",
                        coordinates.lat, coordinates.lng
                    ),
                ))
            })
    }
}

/// Append-only availability log.
#[derive(Default)]
pub struct InMemoryUsageLog {
    records: RwLock<Vec<HistoricalRecord>>,
}

impl InMemoryUsageLog {
    pub fn new(records: Vec<HistoricalRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn append(&self, record: HistoricalRecord) {
        write(&self.records).push(record);
    }

    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoricalUsageSource for InMemoryUsageLog {
    fn records_for(&self, station_id: u32) -> Result<Vec<HistoricalRecord>, UpstreamError> {
        Ok(read(&self.records)
            .iter()
            .filter(|r| r.station_id == station_id)
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn dublin() -> Coordinates {
        Coordinates::new(53.3498, -6.2603)
    }

    #[tokio::test]
    async fn test_catalog_as_repository() {
        let catalog = InMemoryStationCatalog::default();
        assert!(catalog.is_empty());

        catalog
            .save(&StationProfile::new(7, 30, dublin()).with_name("Custom House"))
            .await
            .unwrap();
        catalog.save(&StationProfile::new(3, 20, dublin())).await.unwrap();
        catalog.save(&StationProfile::new(7, 31, dublin())).await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find_by_id(7).await.unwrap().unwrap().capacity, 31);
        assert!(catalog.find_by_id(99).await.unwrap().is_none());
        let ids: Vec<u32> = catalog.get_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 7]);
    }

    #[test]
    fn test_snapshot_sorted_and_missing_location() {
        let snapshot = ForecastSnapshot::new();
        let t0 = Utc.with_ymd_and_hms(2026, 7, 15, 0, 0, 0).unwrap();
        snapshot.replace(
            dublin(),
            vec![
                ForecastSample::new(t0 + Duration::hours(3), 12.0, 70.0, 1010.0),
                ForecastSample::new(t0, 10.0, 75.0, 1011.0),
            ],
        );

        let samples = snapshot.samples_for(Coordinates::new(53.34981, -6.26029)).unwrap();
        assert_eq!(samples[0].timestamp, t0);

        let err = snapshot.samples_for(Coordinates::new(51.5, -0.12)).unwrap_err();
        assert_eq!(err.upstream, "forecast");
    }

    #[tokio::test]
    async fn test_failed_load_reported_by_source() {
        let snapshot = ForecastSnapshot::new();
        let loaded = snapshot
            .load_with(dublin(), async {
                Err::<Vec<ForecastSample>, _>(anyhow::anyhow!("OPENWEATHER_API_KEY is not set"))
            })
            .await;
        assert!(loaded.is_err());

        let err = snapshot.samples_for(dublin()).unwrap_err();
        assert_eq!(err.upstream, "forecast");
        assert!(err.reason.contains("OPENWEATHER_API_KEY"));

        // A later successful load replaces the failure
        let t0 = Utc.with_ymd_and_hms(2026, 7, 15, 0, 0, 0).unwrap();
        let count = snapshot
            .load_with(dublin(), async move {
                Ok::<_, anyhow::Error>(vec![ForecastSample::new(t0, 10.0, 75.0, 1011.0)])
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(snapshot.samples_for(dublin()).unwrap().len(), 1);
    }

    #[test]
    fn test_usage_log_filters_station() {
        let log = InMemoryUsageLog::new(vec![HistoricalRecord::new(1, 8, 0, 5)]);
        log.append(HistoricalRecord::new(2, 8, 0, 9));
        log.append(HistoricalRecord::new(1, 9, 0, 6));

        assert_eq!(log.len(), 3);
        assert_eq!(log.records_for(1).unwrap().len(), 2);
        assert!(log.records_for(3).unwrap().is_empty());
    }
}
