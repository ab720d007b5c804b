pub mod models;
pub mod qr_generator;
pub mod redemption_service;

// Re-exports for shorter imports
pub use models::*;
pub use qr_generator::{GenerationReport, QrConfig, QrGenerator};
pub use redemption_service::RedemptionService;
