//! Persisted models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One redeemed invitation. The row exists only once the id has been scanned,
/// and `scanned_at` is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScanRecord {
    pub id: i64,
    pub scanned_at: DateTime<Utc>,
}
