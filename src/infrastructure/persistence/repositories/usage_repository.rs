use crate::domain::repositories::{AvailabilityObservation, UsageRepository};
use crate::domain::usage::HistoricalRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use sqlx::{Row, SqlitePool};
use tracing::warn;

pub struct SqliteUsageRepository {
    pool: SqlitePool,
}

impl SqliteUsageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageRepository for SqliteUsageRepository {
    async fn record(&self, observation: &AvailabilityObservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO availability (number, available_bikes, available_bike_stands, last_update)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(number, last_update) DO NOTHING
            "#,
        )
        .bind(observation.station_id as i64)
        .bind(observation.available_bikes as i64)
        .bind(observation.available_bike_stands as i64)
        .bind(observation.observed_at.timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to record availability")?;

        Ok(())
    }

    async fn records_for_station(&self, station_id: u32, tz: Tz) -> Result<Vec<HistoricalRecord>> {
        let rows = sqlx::query(
            "SELECT available_bikes, last_update FROM availability WHERE number = ? ORDER BY last_update",
        )
        .bind(station_id as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let bikes: i64 = row.try_get("available_bikes")?;
            let ts: i64 = row.try_get("last_update")?;
            let (Ok(bikes), Some(observed_at)) =
                (u32::try_from(bikes), DateTime::from_timestamp(ts, 0))
            else {
                warn!(
                    "Skipping malformed availability row for station {}: bikes={} ts={}",
                    station_id, bikes, ts
                );
                continue;
            };
            records.push(HistoricalRecord::from_observation(
                station_id,
                observed_at,
                bikes,
                tz,
            ));
        }
        Ok(records)
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM availability")
            .fetch_one(&self.pool)
            .await?
            .try_get("n")?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::Database;
    use chrono::{TimeZone, Utc};

    fn observation(station_id: u32, hour_utc: u32, bikes: u32) -> AvailabilityObservation {
        AvailabilityObservation {
            station_id,
            // Monday 2026-07-13
            observed_at: Utc.with_ymd_and_hms(2026, 7, 13, hour_utc, 0, 0).unwrap(),
            available_bikes: bikes,
            available_bike_stands: 20 - bikes,
        }
    }

    #[tokio::test]
    async fn test_records_bucketed_in_local_time() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let repo = SqliteUsageRepository::new(db.pool.clone());

        repo.record(&observation(42, 7, 3)).await.unwrap();
        repo.record(&observation(42, 22, 15)).await.unwrap();
        repo.record(&observation(9, 7, 1)).await.unwrap();

        let records = repo
            .records_for_station(42, chrono_tz::Europe::Dublin)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        // IST is UTC+1 in July
        assert_eq!(records[0], HistoricalRecord::new(42, 8, 0, 3));
        // 22:00 UTC Monday is 23:00 local, still Monday
        assert_eq!(records[1], HistoricalRecord::new(42, 23, 0, 15));
    }

    #[tokio::test]
    async fn test_duplicate_scrape_ignored() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let repo = SqliteUsageRepository::new(db.pool.clone());

        repo.record(&observation(42, 7, 3)).await.unwrap();
        repo.record(&observation(42, 7, 4)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
