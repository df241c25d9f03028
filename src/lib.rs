// Weibo sentiment service - comment store, topic aggregation and spreadsheet import

// Configuration and shared state
pub mod app_state;
pub mod config;

// Storage - SQLite pool, comment/topic rows, sentiment vocabulary
pub mod database;
pub mod models;

// Derived data - topic aggregation and bulk import
pub mod aggregator;
pub mod importer;

// HTTP API
pub mod api;
pub mod extract;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
