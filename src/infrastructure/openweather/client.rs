use crate::domain::forecast::ForecastSample;
use crate::domain::station::Coordinates;
use crate::infrastructure::core::{HttpClientFactory, build_url_with_query};
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

/// Parse an OpenWeather `/forecast` body into ascending samples.
///
/// Entries missing `dt` or any of `main.{temp,humidity,pressure}` are skipped.
pub fn parse_forecast_response(body: &str) -> anyhow::Result<Vec<ForecastSample>> {
    let response: ForecastResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather forecast body")?;

    let mut samples: Vec<ForecastSample> = response
        .list
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<ForecastEntry>(raw) {
            Ok(entry) => {
                let timestamp = DateTime::<Utc>::from_timestamp(entry.dt, 0)?;
                Some(ForecastSample::new(
                    timestamp,
                    entry.main.temp,
                    entry.main.humidity,
                    entry.main.pressure,
                ))
            }
            Err(e) => {
                debug!("Skipping forecast entry: {}", e);
                None
            }
        })
        .collect();

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

pub struct OpenWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn forecast_url(&self, coordinates: Coordinates) -> String {
        build_url_with_query(
            &self.base_url,
            &[
                ("lat", coordinates.lat.to_string()),
                ("lon", coordinates.lng.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ],
        )
    }

    pub async fn fetch_forecast(
        &self,
        coordinates: Coordinates,
    ) -> anyhow::Result<Vec<ForecastSample>> {
        info!(
            "Fetching forecast for ({:.4}, {:.4}) from OpenWeather...",
            coordinates.lat, coordinates.lng
        );

        let response = self
            .client
            .get(self.forecast_url(coordinates))
            .send()
            .await
            .context("Failed to send request to OpenWeather")?;

        if !response.status().is_success() {
            anyhow::bail!("OpenWeather API returned status: {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read OpenWeather response")?;
        let samples = parse_forecast_response(&body)?;
        if samples.is_empty() {
            warn!("OpenWeather returned no usable forecast entries");
        }
        Ok(samples)
    }
}
