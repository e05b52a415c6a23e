use crate::domain::errors::UpstreamError;
use crate::domain::forecast::ForecastSample;
use crate::domain::ports::{ForecastSource, StationCatalog};
use crate::domain::station::{Coordinates, StationProfile};
use crate::infrastructure::observability::PipelineMetrics;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Memoizes forecast lookups per location for a bounded time.
pub struct TtlForecastSource<S> {
    inner: S,
    cache: Cache<(i64, i64), Arc<Vec<ForecastSample>>>,
    metrics: Option<PipelineMetrics>,
}

impl<S: ForecastSource> TtlForecastSource<S> {
    pub fn new(inner: S, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity as u64)
                .time_to_live(ttl)
                .build(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Whether a live entry exists for these coordinates.
    pub fn is_cached(&self, coordinates: Coordinates) -> bool {
        self.cache.contains_key(&coordinates.cache_key())
    }

    /// Entry count after pending evictions are applied.
    pub fn cached_entries(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<S: ForecastSource> ForecastSource for TtlForecastSource<S> {
    fn samples_for(&self, coordinates: Coordinates) -> Result<Vec<ForecastSample>, UpstreamError> {
        let key = coordinates.cache_key();
        if let Some(samples) = self.cache.get(&key) {
            record(&self.metrics, "forecast", "hit");
            return Ok(samples.as_ref().clone());
        }

        record(&self.metrics, "forecast", "miss");
        debug!(
            "TtlForecastSource: Cache MISS for ({:.4}, {:.4})",
            coordinates.lat, coordinates.lng
        );
        let samples = Arc::new(self.inner.samples_for(coordinates)?);
        self.cache.insert(key, samples.clone());
        Ok(samples.as_ref().clone())
    }
}

/// Memoizes station lookups with no expiry. Unknown ids are not cached.
pub struct CachedStationCatalog<C> {
    inner: C,
    cache: Cache<u32, StationProfile>,
    metrics: Option<PipelineMetrics>,
}

impl<C: StationCatalog> CachedStationCatalog<C> {
    pub fn new(inner: C, capacity: usize) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity as u64).build(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<C: StationCatalog> StationCatalog for CachedStationCatalog<C> {
    fn station(&self, station_id: u32) -> Option<StationProfile> {
        if let Some(station) = self.cache.get(&station_id) {
            record(&self.metrics, "station", "hit");
            return Some(station);
        }

        record(&self.metrics, "station", "miss");
        let station = self.inner.station(station_id)?;
        self.cache.insert(station_id, station.clone());
        Some(station)
    }
}

fn record(metrics: &Option<PipelineMetrics>, cache: &str, result: &str) {
    if let Some(m) = metrics {
        m.inc_cache_lookup(cache, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::CountingForecastSource;
    use crate::infrastructure::repositories::InMemoryStationCatalog;
    use chrono::{TimeZone, Utc};
    use std::thread;

    fn samples() -> Vec<ForecastSample> {
        vec![ForecastSample::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap(),
            11.0,
            75.0,
            1008.0,
        )]
    }

    #[test]
    fn test_forecast_cached_within_ttl() {
        let inner = CountingForecastSource::new(samples());
        let calls = inner.calls();
        let source = TtlForecastSource::new(inner, 8, Duration::from_secs(60));
        let dublin = Coordinates::new(53.3498, -6.2603);

        assert_eq!(source.samples_for(dublin).unwrap().len(), 1);
        assert_eq!(source.samples_for(dublin).unwrap().len(), 1);
        // Sub-metre jitter maps to the same key
        assert_eq!(
            source
                .samples_for(Coordinates::new(53.34981, -6.26031))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_forecast_refetched_after_ttl() {
        let inner = CountingForecastSource::new(samples());
        let calls = inner.calls();
        let source = TtlForecastSource::new(inner, 8, Duration::from_millis(40));
        let dublin = Coordinates::new(53.3498, -6.2603);

        source.samples_for(dublin).unwrap();
        thread::sleep(Duration::from_millis(70));
        source.samples_for(dublin).unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_forecast_errors_not_cached() {
        let inner = CountingForecastSource::failing("provider down");
        let calls = inner.calls();
        let source = TtlForecastSource::new(inner, 8, Duration::from_secs(60));
        let dublin = Coordinates::new(53.3498, -6.2603);

        assert!(source.samples_for(dublin).is_err());
        assert!(source.samples_for(dublin).is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert!(!source.is_cached(dublin));
        assert_eq!(source.cached_entries(), 0);
    }

    #[test]
    fn test_forecast_cache_bounded_by_capacity() {
        let inner = CountingForecastSource::new(samples());
        let source = TtlForecastSource::new(inner, 2, Duration::from_secs(60));

        for i in 0..20 {
            let coords = Coordinates::new(53.0 + f64::from(i) * 0.01, -6.2603);
            source.samples_for(coords).unwrap();
        }
        assert!(source.cached_entries() <= 2);
    }

    #[test]
    fn test_station_catalog_cache() {
        let catalog = InMemoryStationCatalog::new(vec![StationProfile::new(
            5,
            30,
            Coordinates::new(53.34, -6.25),
        )]);
        let metrics = PipelineMetrics::new().unwrap();
        let cached = CachedStationCatalog::new(catalog, 4).with_metrics(metrics.clone());

        assert_eq!(cached.station(5).map(|s| s.capacity), Some(30));
        assert_eq!(cached.station(5).map(|s| s.capacity), Some(30));
        assert!(cached.station(6).is_none());

        let text = metrics.render();
        assert!(text.contains("bikecast_cache_lookups_total"));
        assert!(text.contains(r#"cache="station",result="hit""#));
    }
}
