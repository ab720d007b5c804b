use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::AppError;
use std::fmt;
use std::path::PathBuf;

/// An invitation number known to be inside `1..=capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InvitationId(u32);

impl InvitationId {
    /// Parses a raw query value against the configured capacity.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a plain
    /// decimal integer in range is rejected.
    pub fn parse(raw: &str, capacity: u32) -> Result<Self, RedemptionError> {
        let value: u32 = raw
            .trim()
            .parse()
            .map_err(|_| RedemptionError::InvalidCode(raw.to_string()))?;

        Self::new(value, capacity).ok_or_else(|| RedemptionError::InvalidCode(raw.to_string()))
    }

    pub fn new(value: u32, capacity: u32) -> Option<Self> {
        (1..=capacity).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub(crate) fn as_key(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for InvitationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a valid check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// First scan of this invitation; the record was created now.
    Redeemed {
        id: InvitationId,
        scanned_at: DateTime<Utc>,
    },
    /// The invitation had already been used.
    AlreadyRedeemed { id: InvitationId },
}

impl CheckOutcome {
    pub fn metric_label(&self) -> &'static str {
        match self {
            CheckOutcome::Redeemed { .. } => "redeemed",
            CheckOutcome::AlreadyRedeemed { .. } => "already_redeemed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("Invalid invitation code: {0:?}")]
    InvalidCode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] AppError),
}

impl RedemptionError {
    pub fn metric_label(&self) -> &'static str {
        match self {
            RedemptionError::InvalidCode(_) => "invalid",
            RedemptionError::Storage(_) => "storage_error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QrGenerationError {
    #[error("Error encoding QR code {id}: {message}")]
    Encode { id: u32, message: String },

    #[error("Error rendering PNG for QR code {id}: {source}")]
    Render {
        id: u32,
        #[source]
        source: image::ImageError,
    },

    #[error("Error writing QR code {id} to {path:?}: {source}")]
    Write {
        id: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
