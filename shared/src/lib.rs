//! Shared library for the invitation check service
//!
//! This library contains the pieces used by both binaries:
//! - Configuration loaded from the environment
//! - The application error type
//! - The persisted scan model and its storage backends

pub mod config;
pub mod database;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use database::{connect_scan_store, InsertOutcome, PgScanStore, ScanStore, SqliteScanStore};
pub use error::{AppError, Result};
pub use models::*;
