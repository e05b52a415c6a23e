use super::feature_builder::FeatureBuilder;
use super::prediction_bounder::{DEFAULT_CAPACITY_CEILING, PredictionBounder};
use super::time_series_matcher::closest;
use crate::application::history::historical_aggregator::HistoricalAggregator;
use crate::application::ml::predictor::AvailabilityModel;
use crate::domain::errors::{PipelineError, ValidationError};
use crate::domain::ports::{Clock, ForecastSource, HistoricalUsageSource, StationCatalog, SystemClock};
use crate::domain::prediction::{BoundMode, PredictionQuery, PredictionRequest, PredictionResult};
use crate::domain::station::StationProfile;
use crate::domain::usage::HistoricalPattern;
use crate::infrastructure::observability::PipelineMetrics;
use chrono_tz::Tz;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline knobs that are not collaborators.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub timezone: Tz,
    pub bound_mode: BoundMode,
    pub unknown_capacity_ceiling: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Dublin,
            bound_mode: BoundMode::Clamp,
            unknown_capacity_ceiling: DEFAULT_CAPACITY_CEILING,
        }
    }
}

/// Entry point for the route layer.
///
/// Runs `Validate -> MatchForecast -> BuildFeatures -> Invoke -> Bound` for a
/// prediction, and `fetch -> aggregate` for a usage pattern. Holds no
/// per-request state; one instance is shared by all request handlers.
pub struct PredictionService {
    catalog: Arc<dyn StationCatalog>,
    forecasts: Arc<dyn ForecastSource>,
    history: Arc<dyn HistoricalUsageSource>,
    model: Arc<dyn AvailabilityModel>,
    clock: Arc<dyn Clock>,
    features: FeatureBuilder,
    bounder: PredictionBounder,
    aggregator: HistoricalAggregator,
    timezone: Tz,
    metrics: Option<PipelineMetrics>,
}

impl PredictionService {
    pub fn new(
        catalog: Arc<dyn StationCatalog>,
        forecasts: Arc<dyn ForecastSource>,
        history: Arc<dyn HistoricalUsageSource>,
        model: Arc<dyn AvailabilityModel>,
        settings: PipelineSettings,
    ) -> Self {
        // Scaling is a property of the trained artifact, not a service option
        let features = FeatureBuilder::new(model.feature_scaling(), settings.timezone);
        info!(
            "PredictionService: model={} {} scaling={:?} bound={:?} tz={}",
            model.name(),
            model.version(),
            features.scaling(),
            settings.bound_mode,
            settings.timezone
        );

        Self {
            catalog,
            forecasts,
            history,
            model,
            clock: Arc::new(SystemClock),
            features,
            bounder: PredictionBounder::new(settings.bound_mode, settings.unknown_capacity_ceiling),
            aggregator: HistoricalAggregator::default(),
            timezone: settings.timezone,
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_aggregator(mut self, aggregator: HistoricalAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Parse raw route parameters, then predict.
    pub fn predict_query(&self, query: &PredictionQuery) -> Result<PredictionResult, PipelineError> {
        let request = query
            .parse(self.timezone)
            .map_err(|e| self.record_failure(e.into()))?;
        self.predict_availability(&request)
    }

    pub fn predict_availability(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PipelineError> {
        match self.run(request) {
            Ok(result) => {
                if let Some(m) = &self.metrics {
                    m.inc_prediction("ok");
                }
                Ok(result)
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Run only the Validate stage for raw route parameters. Callers that must
    /// do I/O before matching (fetching a forecast) check the request here first.
    pub fn validate_query(
        &self,
        query: &PredictionQuery,
    ) -> Result<(PredictionRequest, StationProfile), PipelineError> {
        let request = query
            .parse(self.timezone)
            .map_err(|e| self.record_failure(e.into()))?;
        let station = self
            .validate(&request)
            .map_err(|e| self.record_failure(e))?;
        Ok((request, station))
    }

    fn validate(&self, request: &PredictionRequest) -> Result<StationProfile, PipelineError> {
        let station = self.catalog.station(request.station_id).ok_or(
            ValidationError::UnknownStation {
                station_id: request.station_id as i64,
            },
        )?;
        let now = self.clock.now();
        if request.target_instant <= now {
            return Err(ValidationError::PastTime {
                target: request.target_instant,
                now,
            }
            .into());
        }
        Ok(station)
    }

    fn run(&self, request: &PredictionRequest) -> Result<PredictionResult, PipelineError> {
        let station = self.validate(request)?;

        // MatchForecast
        let samples = match &request.forecast_override {
            Some(samples) => Cow::Borrowed(samples.as_slice()),
            None => Cow::Owned(self.forecasts.samples_for(station.coordinates)?),
        };
        let weather = closest(request.target_instant, &samples)?;
        debug!(
            "Station {}: matched forecast {} for target {}",
            station.id, weather.timestamp, request.target_instant
        );

        // BuildFeatures
        let features = self.features.build(&station, weather, request.target_instant)?;
        let out_of_domain = features.out_of_domain_fields();
        if !out_of_domain.is_empty() {
            warn!(
                "Station {}: scaled features outside training domain: {:?}",
                station.id, out_of_domain
            );
        }

        // Invoke
        let raw = self
            .model
            .predict(&features)
            .map_err(|reason| PipelineError::ModelInvocation {
                model: self.model.name().to_string(),
                reason,
            })?;
        if !raw.is_finite() {
            return Err(PipelineError::ModelInvocation {
                model: self.model.name().to_string(),
                reason: format!("non-numeric output {}", raw),
            });
        }
        if let Some(m) = &self.metrics {
            m.observe_raw_output(raw);
        }

        // Bound
        let predicted_bikes = self.bounder.bound(raw, Some(station.capacity));
        info!(
            "Station {} at {}: raw={:.3} -> {} bikes (capacity {})",
            station.id, request.target_instant, raw, predicted_bikes, station.capacity
        );

        Ok(PredictionResult {
            station_id: station.id,
            target_instant: request.target_instant,
            predicted_bikes,
            extrapolated: !out_of_domain.is_empty(),
        })
    }

    fn record_failure(&self, err: PipelineError) -> PipelineError {
        warn!(
            "Prediction failed at {} ({}): {}",
            err.stage(),
            err.reason_label(),
            err
        );
        if let Some(m) = &self.metrics {
            m.inc_prediction("failed");
            m.inc_failure(err.reason_label(), &err.stage().to_string());
        }
        err
    }

    /// Gap-filled hourly usage curve for charting. Best effort: a station with
    /// no history gets the fallback curve, only an unreachable store fails.
    pub fn historical_pattern(
        &self,
        station_id: u32,
        capacity: u32,
    ) -> Result<HistoricalPattern, PipelineError> {
        self.pattern(station_id, capacity, None)
    }

    /// Same as `historical_pattern`, restricted to one ISO weekday (Monday = 0).
    /// A weekday above 6 is a validation failure.
    pub fn weekday_pattern(
        &self,
        station_id: u32,
        capacity: u32,
        weekday: u8,
    ) -> Result<HistoricalPattern, PipelineError> {
        self.pattern(station_id, capacity, Some(weekday))
    }

    fn pattern(
        &self,
        station_id: u32,
        capacity: u32,
        weekday: Option<u8>,
    ) -> Result<HistoricalPattern, PipelineError> {
        if let Some(value) = weekday.filter(|d| *d > 6) {
            let err = PipelineError::from(ValidationError::InvalidWeekday { value });
            warn!("Usage pattern for station {} rejected: {}", station_id, err);
            return Err(err);
        }

        let mut records = self.history.records_for(station_id).map_err(|e| {
            warn!("History for station {} unavailable: {}", station_id, e);
            PipelineError::from(e)
        })?;
        records.retain(|r| r.station_id == station_id);

        let pattern = self
            .aggregator
            .pattern(station_id, &records, capacity, weekday);
        if pattern.is_fallback {
            info!(
                "Station {}: no usable history, serving fallback pattern",
                station_id
            );
        }
        Ok(pattern)
    }
}
