pub mod core;
pub mod mock;
pub mod observability;
pub mod openweather;
pub mod persistence;
pub mod repositories;

pub use repositories::{ForecastSnapshot, InMemoryStationCatalog, InMemoryUsageLog};
