use super::models::{CheckOutcome, InvitationId, RedemptionError};
use crate::observability::metrics::{record_invitation_check, REDEMPTION_PROCESSING_DURATION};
use chrono::Utc;
use shared::{InsertOutcome, ScanStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Validates invitation scans and marks them as used
pub struct RedemptionService {
    store: Arc<dyn ScanStore>,
    capacity: u32,
}

impl RedemptionService {
    pub fn new(store: Arc<dyn ScanStore>, capacity: u32) -> Self {
        Self { store, capacity }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn store(&self) -> &Arc<dyn ScanStore> {
        &self.store
    }

    /// Checks an invitation and redeems it if this is its first scan.
    ///
    /// `raw_id` is the untrusted query value. Validation happens before any
    /// storage access, so an invalid id never creates a record.
    pub async fn check(&self, raw_id: Option<&str>) -> Result<CheckOutcome, RedemptionError> {
        let start_time = std::time::Instant::now();

        let result = self.check_inner(raw_id).await;

        match &result {
            Ok(outcome) => record_invitation_check(outcome.metric_label()),
            Err(e) => record_invitation_check(e.metric_label()),
        }
        REDEMPTION_PROCESSING_DURATION
            .with_label_values(&["check"])
            .observe(start_time.elapsed().as_secs_f64());

        result
    }

    async fn check_inner(&self, raw_id: Option<&str>) -> Result<CheckOutcome, RedemptionError> {
        let id = InvitationId::parse(raw_id.unwrap_or_default(), self.capacity)?;
        let scanned_at = Utc::now();

        match self.store.insert_if_absent(id.as_key(), scanned_at).await? {
            InsertOutcome::Inserted => {
                info!("Invitation {} redeemed at {}", id, scanned_at.to_rfc3339());
                Ok(CheckOutcome::Redeemed { id, scanned_at })
            }
            InsertOutcome::AlreadyPresent => {
                warn!("Invitation {} already redeemed", id);
                Ok(CheckOutcome::AlreadyRedeemed { id })
            }
        }
    }
}
