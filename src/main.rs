//! bikecast - bike-share availability forecasting
//!
//! # Usage
//! ```sh
//! bikecast import-stations --file stations.csv
//! bikecast import --file availability.csv
//! bikecast predict --station 42 --date 2026-07-15 --time 14:00
//! bikecast history --station 42 --weekday 2 --compact
//! ```
//!
//! Configuration comes from the environment (and `.env`), see `Config::from_env`.

use anyhow::{Context, Result};
use bikecast::application::cache::{CachedStationCatalog, TtlForecastSource};
use bikecast::application::forecast::PredictionService;
use bikecast::application::ml::{AvailabilityModel, OnnxPredictor, SmartCorePredictor};
use bikecast::config::{Config, ModelBackend};
use bikecast::domain::errors::PipelineError;
use bikecast::domain::forecast::ForecastSample;
use bikecast::domain::ports::{ForecastSource, HistoricalUsageSource, StationCatalog};
use bikecast::domain::prediction::PredictionQuery;
use bikecast::domain::repositories::{AvailabilityObservation, StationRepository, UsageRepository};
use bikecast::domain::station::{Coordinates, StationProfile};
use bikecast::domain::usage::HourSelection;
use bikecast::infrastructure::observability::PipelineMetrics;
use bikecast::infrastructure::openweather::{OpenWeatherClient, parse_forecast_response};
use bikecast::infrastructure::persistence::{Database, SqliteStationRepository, SqliteUsageRepository};
use bikecast::infrastructure::{ForecastSnapshot, InMemoryStationCatalog, InMemoryUsageLog};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Bike-share availability forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict available bikes at a station for a future local date and time
    Predict {
        /// Station number
        #[arg(short, long)]
        station: String,

        /// Local date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Local time (HH:MM or HH:MM:SS)
        #[arg(short, long)]
        time: String,

        /// OpenWeather forecast JSON to use instead of calling the API
        #[arg(long)]
        forecast_file: Option<PathBuf>,
    },
    /// Print the hourly usage pattern of a station as chart points
    History {
        #[arg(short, long)]
        station: u32,

        /// ISO weekday, Monday = 0
        #[arg(short, long)]
        weekday: Option<u8>,

        /// Only every third hour from 05:00 to 23:00
        #[arg(long)]
        compact: bool,
    },
    /// Load availability observations from CSV
    /// (station_id,timestamp,available_bikes,available_bike_stands)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Load station reference data from CSV
    /// (number,name,position_lat,position_lng,bike_stands)
    ImportStations {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    station_id: u32,
    timestamp: DateTime<Utc>,
    available_bikes: u32,
    available_bike_stands: u32,
}

#[derive(Debug, Deserialize)]
struct StationRow {
    number: u32,
    #[serde(default)]
    name: String,
    position_lat: f64,
    position_lng: f64,
    bike_stands: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "bikecast {} (tz={}, model={:?} {:?})",
        env!("CARGO_PKG_VERSION"),
        config.prediction.timezone,
        config.prediction.model_backend,
        config.prediction.model_path
    );

    let metrics = PipelineMetrics::new()?;
    let db = Database::new(&config.storage.database_url).await?;

    match cli.command {
        Commands::Predict {
            station,
            date,
            time,
            forecast_file,
        } => {
            predict(
                &config,
                &db,
                &metrics,
                PredictionQuery::new(&station, &date, &time),
                forecast_file.as_deref(),
            )
            .await?
        }
        Commands::History {
            station,
            weekday,
            compact,
        } => history(&config, &db, &metrics, station, weekday, compact).await?,
        Commands::Import { file } => import_observations(&db, &file).await?,
        Commands::ImportStations { file } => import_stations(&db, &file).await?,
    }

    debug!("Metrics:\n{}", metrics.render());
    Ok(())
}

async fn load_catalog(db: &Database) -> Result<InMemoryStationCatalog> {
    let stations = SqliteStationRepository::new(db.pool.clone())
        .get_all()
        .await
        .context("Failed to load stations")?;
    info!("Loaded {} stations", stations.len());
    Ok(InMemoryStationCatalog::new(stations))
}

fn load_model(config: &Config) -> Result<Arc<dyn AvailabilityModel>> {
    let p = &config.prediction;
    let model: Arc<dyn AvailabilityModel> = match p.model_backend {
        ModelBackend::SmartCore => {
            Arc::new(SmartCorePredictor::load(&p.model_path, p.model_feature_scaling)?)
        }
        ModelBackend::Onnx => Arc::new(OnnxPredictor::load(&p.model_path, p.model_feature_scaling)?),
    };
    Ok(model)
}

/// Load the forecast for one location into the snapshot. Failures are stored
/// in the snapshot and surface from the pipeline as upstream errors.
async fn load_forecast(
    config: &Config,
    snapshot: &ForecastSnapshot,
    coordinates: Coordinates,
    forecast_file: Option<&Path>,
) {
    let loaded = match forecast_file {
        Some(path) => {
            snapshot
                .load_with(coordinates, async move {
                    let body = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read forecast file {:?}", path))?;
                    parse_forecast_response(&body)
                })
                .await
        }
        None if !config.weather.has_api_key() => {
            snapshot
                .load_with(coordinates, async {
                    Err::<Vec<ForecastSample>, _>(anyhow::anyhow!(
                        "OPENWEATHER_API_KEY is not set and no --forecast-file given"
                    ))
                })
                .await
        }
        None => {
            let client = OpenWeatherClient::new(
                &config.weather.base_url,
                &config.weather.api_key,
                config.weather.http_timeout(),
            );
            snapshot.refresh(&client, coordinates).await
        }
    };
    if let Ok(count) = loaded {
        debug!("Forecast ready: {} samples", count);
    }
}

fn build_service(
    config: &Config,
    metrics: &PipelineMetrics,
    catalog: Arc<dyn StationCatalog>,
    forecasts: Arc<dyn ForecastSource>,
    history: Arc<dyn HistoricalUsageSource>,
) -> Result<PredictionService> {
    Ok(PredictionService::new(
        catalog,
        forecasts,
        history,
        load_model(config)?,
        config.prediction.pipeline_settings(),
    )
    .with_metrics(metrics.clone()))
}

fn pipeline_failure(err: PipelineError) -> anyhow::Error {
    anyhow::anyhow!("Prediction failed ({}): {}", err.reason_label(), err)
}

async fn predict(
    config: &Config,
    db: &Database,
    metrics: &PipelineMetrics,
    query: PredictionQuery,
    forecast_file: Option<&Path>,
) -> Result<()> {
    let catalog = CachedStationCatalog::new(
        load_catalog(db).await?,
        config.storage.station_cache_capacity,
    )
    .with_metrics(metrics.clone());

    let snapshot = Arc::new(ForecastSnapshot::new());
    let forecasts = TtlForecastSource::new(
        snapshot.clone(),
        config.weather.cache_capacity,
        config.weather.cache_ttl(),
    )
    .with_metrics(metrics.clone());

    let service = build_service(
        config,
        metrics,
        Arc::new(catalog),
        Arc::new(forecasts),
        Arc::new(InMemoryUsageLog::default()),
    )?;

    // Nothing is fetched for a request that fails validation
    let (request, station) = service.validate_query(&query).map_err(pipeline_failure)?;
    load_forecast(config, &snapshot, station.coordinates, forecast_file).await;

    let result = service
        .predict_availability(&request)
        .map_err(pipeline_failure)?;
    if result.extrapolated {
        warn!("Prediction used weather outside the model's training range");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn history(
    config: &Config,
    db: &Database,
    metrics: &PipelineMetrics,
    station_id: u32,
    weekday: Option<u8>,
    compact: bool,
) -> Result<()> {
    let catalog = load_catalog(db).await?;
    let station = catalog
        .station(station_id)
        .with_context(|| format!("Unknown station {}", station_id))?;

    let records = SqliteUsageRepository::new(db.pool.clone())
        .records_for_station(station_id, config.prediction.timezone)
        .await?;
    info!("Station {}: {} observations", station_id, records.len());

    let service = build_service(
        config,
        metrics,
        Arc::new(catalog),
        Arc::new(ForecastSnapshot::new()),
        Arc::new(InMemoryUsageLog::new(records)),
    )?;
    let pattern = match weekday {
        Some(day) => service.weekday_pattern(station_id, station.capacity, day),
        None => service.historical_pattern(station_id, station.capacity),
    }
    .map_err(|e| anyhow::anyhow!("Usage pattern failed ({}): {}", e.reason_label(), e))?;

    let selection = if compact {
        HourSelection::default()
    } else {
        HourSelection::ALL
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&pattern.chart_points(selection))?
    );
    Ok(())
}

async fn import_observations(db: &Database, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));
    let repo = SqliteUsageRepository::new(db.pool.clone());

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<ObservationRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping row {}: {}", line + 1, e);
                skipped += 1;
                continue;
            }
        };
        repo.record(&AvailabilityObservation {
            station_id: row.station_id,
            observed_at: row.timestamp,
            available_bikes: row.available_bikes,
            available_bike_stands: row.available_bike_stands,
        })
        .await?;
        imported += 1;
    }

    info!(
        "Imported {} observations ({} skipped), {} total",
        imported,
        skipped,
        repo.count().await?
    );
    Ok(())
}

async fn import_stations(db: &Database, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));
    let repo = SqliteStationRepository::new(db.pool.clone());

    let mut imported = 0usize;
    for result in rdr.deserialize::<StationRow>() {
        let row = result.context("Malformed station row")?;
        let station = StationProfile::new(
            row.number,
            row.bike_stands,
            Coordinates::new(row.position_lat, row.position_lng),
        )
        .with_name(row.name);
        repo.save(&station).await?;
        imported += 1;
    }

    info!("Imported {} stations", imported);
    Ok(())
}
