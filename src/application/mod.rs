// Prediction pipeline: matcher, features, bounding, orchestration
pub mod forecast;

// Historical usage patterns
pub mod history;

// Model backends
pub mod ml;

// Memoizing wrappers around slow collaborators
pub mod cache;
