//! Batch synchronisation of a user's bookings
//!
//! `intelligent_sync` diffs a snapshot of the user's bookings against their
//! sync state and only touches what changed; `sync_all_user_bookings`
//! reconciles every eligible booking unconditionally.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use stagesync_domain::{
    ActionLogEntry, BatchSyncReport, Booking, BookingStatus, FullSyncReport, StageSyncError,
    SyncAction, SyncOperation, SyncSettings,
};
use tracing::{error, info, instrument};

use super::ports::BookingFilter;
use super::reconciler::SyncReconciler;

/// Classify bookings into create, update and delete actions.
///
/// Phases are mutually exclusive: a booking yields at most one action.
/// Creates come first, then updates, then deletes.
pub fn plan_sync_actions(bookings: &[Booking], now: DateTime<Utc>) -> Vec<SyncAction> {
    let creates = bookings
        .iter()
        .filter(|b| b.is_syncable(now) && b.sync.external_event_id.is_none())
        .map(|b| SyncAction::Create(b.id));

    let updates = bookings
        .iter()
        .filter(|b| {
            b.is_syncable(now)
                && b.sync.external_event_id.is_some()
                && b.sync.synced
                && b.has_unsynced_changes()
        })
        .map(|b| SyncAction::Update(b.id));

    let deletes = bookings
        .iter()
        .filter(|b| b.status.is_retired() && b.sync.external_event_id.is_some())
        .map(|b| SyncAction::Delete(b.id));

    creates.chain(updates).chain(deletes).collect()
}

/// Runs batch syncs through a shared [`SyncReconciler`]
pub struct SyncOrchestrator {
    reconciler: Arc<SyncReconciler>,
    workers: usize,
}

impl SyncOrchestrator {
    /// Create an orchestrator with the default worker count
    pub fn new(reconciler: Arc<SyncReconciler>) -> Self {
        Self { reconciler, workers: SyncSettings::default().workers() }
    }

    /// Apply the batch worker count from settings.
    pub fn with_settings(mut self, settings: &SyncSettings) -> Self {
        self.workers = settings.workers();
        self
    }

    /// Three-phase diff sync over the user's bookings as of now
    #[instrument(skip(self))]
    pub async fn intelligent_sync(&self, user_id: &str) -> BatchSyncReport {
        let filter = BookingFilter::for_user(user_id);
        let snapshot = match self.reconciler.repository().find_bookings(&filter).await {
            Ok(bookings) => bookings,
            Err(err) => {
                error!(error = %err, "could not load bookings for sync");
                return BatchSyncReport::fatal(err.to_string());
            }
        };

        let plan = plan_sync_actions(&snapshot, self.reconciler.clock().now());
        info!(bookings = snapshot.len(), planned = plan.len(), "sync plan ready");

        let executed = stream::iter(plan.into_iter().enumerate())
            .map(|(position, action)| async move {
                let result = match action {
                    SyncAction::Create(id) | SyncAction::Update(id) => {
                        self.reconciler.reconcile(id).await
                    }
                    SyncAction::Delete(id) => self.reconciler.remove(id).await,
                }?;
                Ok::<_, StageSyncError>((position, ActionLogEntry { action, result }))
            })
            .buffer_unordered(self.workers)
            .try_collect::<Vec<_>>()
            .await;

        let mut executed = match executed {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, "sync batch aborted");
                return BatchSyncReport::fatal(err.to_string());
            }
        };
        executed.sort_by_key(|(position, _)| *position);

        let mut report = BatchSyncReport {
            success: true,
            message: String::new(),
            actions: executed.into_iter().map(|(_, entry)| entry).collect(),
            error: None,
        };
        report.message = summarize(&report);
        info!(actions = report.actions.len(), message = %report.message, "intelligent sync finished");
        report
    }

    /// Reconcile every syncable, future booking of the user
    #[instrument(skip(self))]
    pub async fn sync_all_user_bookings(&self, user_id: &str) -> FullSyncReport {
        let now = self.reconciler.clock().now();
        let filter = BookingFilter::for_user(user_id)
            .with_statuses(BookingStatus::SYNCABLE)
            .starting_after(now);

        let bookings = match self.reconciler.repository().find_bookings(&filter).await {
            Ok(bookings) => bookings,
            Err(err) => {
                error!(error = %err, "could not load bookings for full sync");
                return FullSyncReport::fatal(err.to_string());
            }
        };

        let ids: Vec<_> =
            bookings.iter().filter(|booking| booking.is_syncable(now)).map(|b| b.id).collect();

        let results = stream::iter(ids.into_iter().enumerate())
            .map(|(position, id)| async move {
                self.reconciler.reconcile(id).await.map(|result| (position, result))
            })
            .buffer_unordered(self.workers)
            .try_collect::<Vec<_>>()
            .await;

        let mut results = match results {
            Ok(results) => results,
            Err(err) => {
                error!(error = %err, "full sync aborted");
                return FullSyncReport::fatal(err.to_string());
            }
        };
        results.sort_by_key(|(position, _)| *position);
        let results: Vec<_> = results.into_iter().map(|(_, result)| result).collect();

        let synchronized = results.iter().filter(|result| result.success).count();
        let failed = results.len() - synchronized;
        info!(synchronized, failed, "full sync finished");

        FullSyncReport {
            success: true,
            message: format!("{synchronized} bookings synchronized, {failed} failed"),
            synchronized,
            failed,
            results,
            error: None,
        }
    }
}

fn summarize(report: &BatchSyncReport) -> String {
    if report.actions.is_empty() {
        return "calendar already up to date".to_string();
    }
    let failed = report.actions.iter().filter(|entry| !entry.result.success).count();
    format!(
        "{} created, {} updated, {} deleted, {failed} failed",
        report.count(SyncOperation::Create, true),
        report.count(SyncOperation::Update, true),
        report.count(SyncOperation::Delete, true),
    )
}
