use crate::domain::repositories::StationRepository;
use crate::domain::station::{Coordinates, StationProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

pub struct SqliteStationRepository {
    pool: SqlitePool,
}

impl SqliteStationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn station_from_row(row: &SqliteRow) -> Result<StationProfile> {
    let number: i64 = row.try_get("number")?;
    let bike_stands: i64 = row.try_get("bike_stands")?;
    Ok(StationProfile {
        id: u32::try_from(number).context("station number out of range")?,
        name: row.try_get("name")?,
        capacity: u32::try_from(bike_stands).context("bike_stands out of range")?,
        coordinates: Coordinates::new(row.try_get("position_lat")?, row.try_get("position_lng")?),
    })
}

#[async_trait]
impl StationRepository for SqliteStationRepository {
    async fn save(&self, station: &StationProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO station (number, name, position_lat, position_lng, bike_stands)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(number) DO UPDATE SET
                name = excluded.name,
                position_lat = excluded.position_lat,
                position_lng = excluded.position_lng,
                bike_stands = excluded.bike_stands
            "#,
        )
        .bind(station.id as i64)
        .bind(&station.name)
        .bind(station.coordinates.lat)
        .bind(station.coordinates.lng)
        .bind(station.capacity as i64)
        .execute(&self.pool)
        .await
        .context("Failed to save station")?;

        debug!("Persisted station {}", station.id);
        Ok(())
    }

    async fn find_by_id(&self, station_id: u32) -> Result<Option<StationProfile>> {
        let row = sqlx::query("SELECT * FROM station WHERE number = ?")
            .bind(station_id as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(station_from_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<StationProfile>> {
        let rows = sqlx::query("SELECT * FROM station ORDER BY number")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(station_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::Database;

    #[tokio::test]
    async fn test_save_upserts_and_reads_back() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let repo = SqliteStationRepository::new(db.pool.clone());

        let coords = Coordinates::new(53.3498, -6.2603);
        repo.save(&StationProfile::new(42, 20, coords).with_name("Smithfield"))
            .await
            .unwrap();
        repo.save(&StationProfile::new(42, 25, coords).with_name("Smithfield North"))
            .await
            .unwrap();
        repo.save(&StationProfile::new(5, 40, coords)).await.unwrap();

        let station = repo.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(station.capacity, 25);
        assert_eq!(station.name, "Smithfield North");
        assert_eq!(station.coordinates, coords);

        assert!(repo.find_by_id(1).await.unwrap().is_none());
        let ids: Vec<u32> = repo.get_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 42]);
    }
}
