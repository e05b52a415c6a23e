//! Pipeline observability.
//!
//! Counters and histograms live in a private prometheus registry and are
//! rendered as text on demand; nothing is served or pushed.

pub mod metrics;

pub use metrics::PipelineMetrics;
