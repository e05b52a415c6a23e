pub mod historical_aggregator;

pub use historical_aggregator::HistoricalAggregator;
