pub mod cached_sources;

pub use cached_sources::{CachedStationCatalog, TtlForecastSource};
