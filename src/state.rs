use crate::domains::invitations::RedemptionService;
use shared::{connect_scan_store, Config, ScanStore};
use std::sync::Arc;

/// Shared application state.
/// Holds the redemption service and, through it, the scan store.
#[derive(Clone)]
pub struct AppState {
    pub redemption_service: Arc<RedemptionService>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = connect_scan_store(&config.database).await?;
        tracing::info!(
            "✅ Scan store connected, accepting invitation ids 1..={}",
            config.invitations.capacity
        );

        Ok(Self::from_store(store, config.invitations.capacity))
    }

    /// Builds the state around an already connected store.
    pub fn from_store(store: Arc<dyn ScanStore>, capacity: u32) -> Self {
        Self {
            redemption_service: Arc::new(RedemptionService::new(store, capacity)),
        }
    }
}
