use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared SQLite pool holding station reference data and the availability log.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        let in_memory = db_url.contains(":memory:");

        // Ensure the directory exists if it's a file path
        if !in_memory && let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to ":memory:" is its own database
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Station reference data
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS station (
                number INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                position_lat REAL NOT NULL,
                position_lng REAL NOT NULL,
                bike_stands INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create station table")?;

        // 2. Availability log, one row per scrape
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS availability (
                number INTEGER NOT NULL,
                available_bikes INTEGER NOT NULL,
                available_bike_stands INTEGER NOT NULL,
                last_update INTEGER NOT NULL,
                PRIMARY KEY (number, last_update)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create availability table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_availability_number
            ON availability (number);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create availability index")?;

        info!("Database schema initialized.");
        Ok(())
    }
}
