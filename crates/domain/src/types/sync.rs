//! Results and reports produced by the sync engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::{BookingId, ParticipantRole};
use crate::errors::SyncFailure;
use crate::impl_domain_status_conversions;

/// Provider call issued for one target account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl_domain_status_conversions!(SyncOperation {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

/// Outcome of one provider call against one participant's calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub role: ParticipantRole,
    pub user_id: String,
    pub operation: SyncOperation,
    pub success: bool,
    /// Event id returned by a successful create.
    pub external_id: Option<String>,
    /// Raw provider message on failure.
    pub error: Option<String>,
}

/// Result of reconciling or removing a single booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub booking_id: BookingId,
    pub success: bool,
    pub message: String,
    pub external_id: Option<String>,
    pub actions: Vec<TargetOutcome>,
    pub error: Option<SyncFailure>,
}

impl SyncResult {
    pub fn succeeded(
        booking_id: BookingId,
        message: impl Into<String>,
        external_id: Option<String>,
        actions: Vec<TargetOutcome>,
    ) -> Self {
        Self { booking_id, success: true, message: message.into(), external_id, actions, error: None }
    }

    /// Failure before any provider call was made.
    pub fn rejected(booking_id: BookingId, failure: SyncFailure) -> Self {
        Self {
            booking_id,
            success: false,
            message: failure.to_string(),
            external_id: None,
            actions: Vec::new(),
            error: Some(failure),
        }
    }

    /// Every target failed; the message carries the first provider error.
    pub fn all_targets_failed(
        booking_id: BookingId,
        external_id: Option<String>,
        actions: Vec<TargetOutcome>,
    ) -> Self {
        let detail = actions
            .iter()
            .find_map(|outcome| outcome.error.clone())
            .unwrap_or_else(|| "unknown provider error".to_string());
        Self {
            booking_id,
            success: false,
            message: format!("calendar sync failed: {detail}"),
            external_id,
            actions,
            error: Some(SyncFailure::Provider { message: detail }),
        }
    }

    pub fn succeeded_targets(&self) -> usize {
        self.actions.iter().filter(|outcome| outcome.success).count()
    }

    pub fn failed_targets(&self) -> usize {
        self.actions.len() - self.succeeded_targets()
    }
}

/// Batch action chosen for one booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "booking_id", rename_all = "snake_case")]
pub enum SyncAction {
    Create(BookingId),
    Update(BookingId),
    Delete(BookingId),
}

impl SyncAction {
    pub fn booking_id(&self) -> BookingId {
        match self {
            Self::Create(id) | Self::Update(id) | Self::Delete(id) => *id,
        }
    }
}

/// Action log line of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub action: SyncAction,
    pub result: SyncResult,
}

/// Report of the diff-based batch sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSyncReport {
    pub success: bool,
    pub message: String,
    pub actions: Vec<ActionLogEntry>,
    /// Set only when an infrastructure failure stopped the batch.
    pub error: Option<String>,
}

impl BatchSyncReport {
    pub fn fatal(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: format!("sync aborted: {error}"),
            actions: Vec::new(),
            error: Some(error),
        }
    }

    pub fn count(&self, op: SyncOperation, success: bool) -> usize {
        self.actions
            .iter()
            .filter(|entry| {
                let kind = match entry.action {
                    SyncAction::Create(_) => SyncOperation::Create,
                    SyncAction::Update(_) => SyncOperation::Update,
                    SyncAction::Delete(_) => SyncOperation::Delete,
                };
                kind == op && entry.result.success == success
            })
            .count()
    }
}

/// Report of the unconditional full sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullSyncReport {
    pub success: bool,
    pub message: String,
    pub synchronized: usize,
    pub failed: usize,
    pub results: Vec<SyncResult>,
    pub error: Option<String>,
}

impl FullSyncReport {
    pub fn fatal(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: format!("sync aborted: {error}"),
            synchronized: 0,
            failed: 0,
            results: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Identical start and end on both sides
    ExactMatch,
    Overlap,
}

/// A booking colliding with an event already on the external calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub booking_id: BookingId,
    pub external_event_id: Option<String>,
    pub event_title: String,
    /// Start of the overlapping region.
    pub anchor: DateTime<Utc>,
    pub kind: ConflictKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictRecord>,
}

impl ConflictReport {
    pub fn from_records(conflicts: Vec<ConflictRecord>) -> Self {
        Self { has_conflicts: !conflicts.is_empty(), conflicts }
    }
}

/// Sync coverage of a user's upcoming bookings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub total: usize,
    pub synced: usize,
    pub unsynced: usize,
    pub sync_errors: usize,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub sync_percentage: u8,
}

/// Inputs the health verdict was derived from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDetails {
    pub credentials_valid: bool,
    pub calendar_reachable: bool,
    pub calendar: Option<super::event::CalendarAccess>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub conflict_count: Option<usize>,
    pub stats: Option<SyncStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub details: HealthDetails,
}
