//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::BookingStatus;

/// Main error type for StageSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StageSyncError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calendar provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for StageSync operations
pub type Result<T> = std::result::Result<T, StageSyncError>;

/// Why a single booking could not be reconciled.
///
/// These never cross a component boundary as an `Err`; they travel inside a
/// [`crate::SyncResult`] so batches can keep going past them. Only
/// [`SyncFailure::Infrastructure`] is allowed to stop a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncFailure {
    #[error("booking is not eligible for calendar sync (status: {status})")]
    InvalidState { status: BookingStatus },

    #[error("no connected calendar account among the booking participants")]
    NoTargets,

    #[error("booking has no external calendar event")]
    NotSynced,

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("calendar provider error: {message}")]
    Provider { message: String },

    #[error("infrastructure failure: {message}")]
    Infrastructure { message: String },
}

impl SyncFailure {
    /// Whether this failure must abort a surrounding batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Infrastructure { .. })
    }
}

impl From<StageSyncError> for SyncFailure {
    fn from(value: StageSyncError) -> Self {
        match value {
            StageSyncError::NotFound(message) => Self::NotFound { message },
            StageSyncError::Network(message)
            | StageSyncError::Auth(message)
            | StageSyncError::Provider(message)
            | StageSyncError::InvalidInput(message) => Self::Provider { message },
            StageSyncError::Database(message)
            | StageSyncError::Config(message)
            | StageSyncError::Internal(message) => Self::Infrastructure { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_infrastructure_failures_are_fatal() {
        assert!(SyncFailure::Infrastructure { message: "db down".into() }.is_fatal());
        assert!(!SyncFailure::NoTargets.is_fatal());
        assert!(!SyncFailure::NotSynced.is_fatal());
        assert!(!SyncFailure::Provider { message: "500".into() }.is_fatal());
    }

    #[test]
    fn provider_side_errors_map_to_provider_failure() {
        let failure = SyncFailure::from(StageSyncError::Auth("token revoked".into()));
        assert_eq!(failure, SyncFailure::Provider { message: "token revoked".into() });

        let failure = SyncFailure::from(StageSyncError::Database("pool exhausted".into()));
        assert!(failure.is_fatal());
    }

    #[test]
    fn invalid_state_message_names_status() {
        let failure = SyncFailure::InvalidState { status: BookingStatus::Cancelled };
        assert!(failure.to_string().contains("cancelled"));
    }

    #[test]
    fn error_serializes_with_type_tag() {
        let json = serde_json::to_value(StageSyncError::NotFound("booking".into())).unwrap();
        assert_eq!(json["type"], "NotFound");
        assert_eq!(json["message"], "booking");
    }
}
