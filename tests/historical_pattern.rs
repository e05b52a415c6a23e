use bikecast::application::forecast::{PipelineSettings, PredictionService};
use bikecast::domain::repositories::{AvailabilityObservation, StationRepository, UsageRepository};
use bikecast::domain::station::{Coordinates, StationProfile};
use bikecast::domain::usage::{DEFAULT_OCCUPANCY_CURVE, HourSelection};
use bikecast::infrastructure::mock::{CountingForecastSource, StubModel};
use bikecast::infrastructure::persistence::{Database, SqliteStationRepository, SqliteUsageRepository};
use bikecast::infrastructure::{InMemoryStationCatalog, InMemoryUsageLog};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

const TZ: chrono_tz::Tz = chrono_tz::Europe::Dublin;

fn service(log: InMemoryUsageLog, stations: Vec<StationProfile>) -> PredictionService {
    PredictionService::new(
        Arc::new(InMemoryStationCatalog::new(stations)),
        Arc::new(CountingForecastSource::new(vec![])),
        Arc::new(log),
        Arc::new(StubModel::returning(0.0)),
        PipelineSettings::default(),
    )
}

#[test]
fn test_station_without_history_gets_fallback_curve() {
    let service = service(InMemoryUsageLog::default(), vec![]);

    let pattern = service.historical_pattern(7, 30).unwrap();

    assert!(pattern.is_fallback);
    assert_eq!(pattern.hours.len(), 24);
    for (hour, agg) in pattern.hours.iter().enumerate() {
        assert_eq!(agg.hour_of_day as usize, hour);
        assert!((agg.mean_bikes_available - DEFAULT_OCCUPANCY_CURVE[hour] * 30.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_sqlite_history_to_chart_points() -> anyhow::Result<()> {
    let db = Database::new("sqlite::memory:").await?;
    let stations = SqliteStationRepository::new(db.pool.clone());
    let usage = SqliteUsageRepository::new(db.pool.clone());

    let station = StationProfile::new(42, 20, Coordinates::new(53.3476, -6.2782));
    stations.save(&station).await?;

    // Monday 2026-07-13, 07:00 and 07:30 UTC are 08:xx local; 17:00 UTC is 18:00 local
    let monday = Utc.with_ymd_and_hms(2026, 7, 13, 7, 0, 0).unwrap();
    for (offset, bikes) in [(Duration::zero(), 4), (Duration::minutes(30), 6), (Duration::hours(10), 25)] {
        usage
            .record(&AvailabilityObservation {
                station_id: 42,
                observed_at: monday + offset,
                available_bikes: bikes,
                available_bike_stands: 20u32.saturating_sub(bikes),
            })
            .await?;
    }

    let records = usage.records_for_station(42, TZ).await?;
    let service = service(InMemoryUsageLog::new(records), stations.get_all().await?);

    let pattern = service.historical_pattern(42, station.capacity)?;
    assert!(!pattern.is_fallback);

    let by_hour = |h: usize| pattern.hours[h];
    // Leading gap back-filled from the first observed hour
    assert_eq!(by_hour(0).mean_bikes_available, 5.0);
    assert_eq!(by_hour(8).mean_bikes_available, 5.0);
    // Gap between observations forward-filled
    assert_eq!(by_hour(12).mean_bikes_available, 5.0);
    // Over-capacity mean is kept raw but clamped for charting
    assert_eq!(by_hour(18).mean_bikes_available, 25.0);
    assert_eq!(by_hour(18).available_bikes, 20.0);
    assert_eq!(by_hour(18).available_stands, 0.0);
    assert_eq!(by_hour(23).mean_bikes_available, 25.0);

    let points = pattern.chart_points(HourSelection::default());
    let labels: Vec<&str> = points.iter().map(|p| p.timestamp.as_str()).collect();
    assert_eq!(
        labels,
        vec!["05:00", "08:00", "11:00", "14:00", "17:00", "20:00", "23:00"]
    );
    assert_eq!(points[1].available_bikes, 5.0);
    assert_eq!(points[1].available_stands, 15.0);

    // Monday only: same shape; Tuesday has nothing and falls back
    assert!(!service.weekday_pattern(42, 20, 0)?.is_fallback);
    assert!(service.weekday_pattern(42, 20, 1)?.is_fallback);

    // Out-of-range weekday is a caller error, not a fallback curve
    let err = service.weekday_pattern(42, 20, 7).unwrap_err();
    assert_eq!(err.reason_label(), "invalid_weekday");

    Ok(())
}
