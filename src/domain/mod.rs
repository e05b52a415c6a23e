// Weather forecast samples
pub mod forecast;

// Model feature layout
pub mod ml;

// Requests, results and pipeline stages
pub mod prediction;

// Station reference data
pub mod station;

// Historical usage records and patterns
pub mod usage;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
