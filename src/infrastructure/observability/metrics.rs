//! Prometheus metrics definitions for bikecast
//!
//! All metrics use the `bikecast_` prefix.

use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for the prediction pipeline
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    /// Prediction requests by outcome (ok / failed)
    pub predictions_total: CounterVec,
    /// Failed predictions by reason and stage
    pub prediction_failures_total: CounterVec,
    /// Cache lookups by cache name and result (hit / miss)
    pub cache_lookups_total: CounterVec,
    /// Raw, unbounded model output
    pub model_output_raw: Histogram,
}

impl PipelineMetrics {
    /// Create a new PipelineMetrics instance with all counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("bikecast_predictions_total", "Prediction requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_failures_total = CounterVec::new(
            Opts::new(
                "bikecast_prediction_failures_total",
                "Failed predictions by reason and pipeline stage",
            ),
            &["reason", "stage"],
        )?;
        registry.register(Box::new(prediction_failures_total.clone()))?;

        let cache_lookups_total = CounterVec::new(
            Opts::new("bikecast_cache_lookups_total", "Cache lookups by result"),
            &["cache", "result"],
        )?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        let model_output_raw = Histogram::with_opts(
            HistogramOpts::new("bikecast_model_output_raw", "Raw model output before bounding")
                .buckets(vec![-10.0, 0.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0, 60.0]),
        )?;
        registry.register(Box::new(model_output_raw.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            prediction_failures_total,
            cache_lookups_total,
            model_output_raw,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_prediction(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_failure(&self, reason: &str, stage: &str) {
        self.prediction_failures_total
            .with_label_values(&[reason, stage])
            .inc();
    }

    pub fn inc_cache_lookup(&self, cache: &str, result: &str) {
        self.cache_lookups_total
            .with_label_values(&[cache, result])
            .inc();
    }

    pub fn observe_raw_output(&self, raw: f64) {
        self.model_output_raw.observe(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        let metrics = PipelineMetrics::new().unwrap();
        metrics.inc_prediction("ok");
        metrics.inc_failure("past_time", "validate");
        metrics.observe_raw_output(12.5);

        let text = metrics.render();
        assert!(text.contains("bikecast_predictions_total{outcome=\"ok\"} 1"));
        assert!(text.contains("bikecast_prediction_failures_total"));
        assert!(text.contains("bikecast_model_output_raw_count 1"));
    }
}
