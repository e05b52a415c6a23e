pub mod station_repository;
pub mod usage_repository;

pub use station_repository::SqliteStationRepository;
pub use usage_repository::SqliteUsageRepository;
