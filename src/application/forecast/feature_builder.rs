use crate::domain::errors::FeatureError;
use crate::domain::forecast::ForecastSample;
use crate::domain::ml::feature_registry::{
    DAY_OF_WEEK_MAX, FeatureScaling, FeatureVector, HOUR_MAX, HUMIDITY_MAX, PRESSURE_DOMAIN_HPA,
    StationHourKey, TEMPERATURE_DOMAIN_C, min_max,
};
use crate::domain::station::StationProfile;
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

/// Turns (station, weather, target instant) into the model's input vector.
///
/// Calendar features are taken in the builder's pinned timezone, never the
/// host clock's. Out-of-domain readings are scaled as-is; bounding the model
/// output is the only clamp in the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder {
    scaling: FeatureScaling,
    timezone: Tz,
}

impl FeatureBuilder {
    pub fn new(scaling: FeatureScaling, timezone: Tz) -> Self {
        Self { scaling, timezone }
    }

    pub fn scaling(&self) -> FeatureScaling {
        self.scaling
    }

    pub fn build(
        &self,
        station: &StationProfile,
        weather: &ForecastSample,
        target_instant: DateTime<Utc>,
    ) -> Result<FeatureVector, FeatureError> {
        let temperature = finite("temperature", weather.temperature)?;
        let humidity = finite("humidity", weather.humidity)?;
        let pressure = finite("pressure", weather.pressure)?;

        let local = target_instant.with_timezone(&self.timezone);
        let hour = local.hour();
        let day_of_week = local.weekday().num_days_from_monday();
        let station_hour_key = StationHourKey::new(station.id, hour);

        let vector = match self.scaling {
            FeatureScaling::Raw => FeatureVector {
                station_id: station.id,
                temperature,
                humidity,
                pressure,
                hour: hour as f64,
                station_hour_key,
                day_of_week: day_of_week as f64,
                scaling: self.scaling,
            },
            FeatureScaling::MinMax => FeatureVector {
                station_id: station.id,
                temperature: min_max(temperature, TEMPERATURE_DOMAIN_C),
                humidity: humidity / HUMIDITY_MAX,
                pressure: min_max(pressure, PRESSURE_DOMAIN_HPA),
                hour: hour as f64 / HOUR_MAX,
                station_hour_key,
                day_of_week: day_of_week as f64 / DAY_OF_WEEK_MAX,
                scaling: self.scaling,
            },
        };

        Ok(vector)
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, FeatureError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FeatureError::InvalidInput { field })
    }
}
