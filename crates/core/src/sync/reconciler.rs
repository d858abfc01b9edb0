//! Single-booking reconciliation against participants' calendars
//!
//! A booking is mirrored into every participant calendar whose account is
//! connected (at most performer and venue). Each target is called
//! independently; a target failure is recorded in the result, never raised.
//! Only booking-store failures surface as `Err`.

use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use stagesync_domain::{
    Booking, BookingId, EventPatch, ExternalEvent, ParticipantRole, Result, StageSyncError,
    SyncFailure, SyncOperation, SyncResult, SyncSettings, SyncState, TargetOutcome,
};
use tracing::{debug, info, instrument, warn};

use super::locks::BookingLocks;
use super::ports::BookingRepository;
use super::translator::EventTranslator;
use crate::calendar_ports::{CalendarClient, CalendarClientFactory, CredentialProvider};
use crate::clock::{Clock, SystemClock};

/// A participant calendar the booking will be written to
#[derive(Clone)]
pub struct SyncTarget {
    /// Which side of the booking owns this calendar.
    pub role: ParticipantRole,
    /// Account the token was issued for.
    pub user_id: String,
    /// Client bound to that account's token.
    pub client: Arc<dyn CalendarClient>,
}

/// Reconciles one booking at a time with its target calendars
pub struct SyncReconciler {
    repository: Arc<dyn BookingRepository>,
    credentials: Arc<dyn CredentialProvider>,
    clients: Arc<dyn CalendarClientFactory>,
    clock: Arc<dyn Clock>,
    translator: EventTranslator,
    locks: BookingLocks,
    workers: usize,
}

impl SyncReconciler {
    /// Create a reconciler with the system clock and default settings
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        credentials: Arc<dyn CredentialProvider>,
        clients: Arc<dyn CalendarClientFactory>,
    ) -> Self {
        Self {
            repository,
            credentials,
            clients,
            clock: Arc::new(SystemClock),
            translator: EventTranslator::default(),
            locks: BookingLocks::new(),
            workers: SyncSettings::default().workers(),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the booking-to-event translator.
    pub fn with_translator(mut self, translator: EventTranslator) -> Self {
        self.translator = translator;
        self
    }

    /// Apply display zone and worker count from settings.
    pub fn with_settings(mut self, settings: &SyncSettings) -> Result<Self> {
        self.translator = EventTranslator::from_settings(settings)?;
        self.workers = settings.workers();
        Ok(self)
    }

    /// Time source shared with the orchestrator.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Booking store the reconciler reads and writes.
    pub fn repository(&self) -> &Arc<dyn BookingRepository> {
        &self.repository
    }

    /// Create or update the booking's event in every target calendar
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn reconcile(&self, booking_id: BookingId) -> Result<SyncResult> {
        let _guard = self.locks.acquire(booking_id).await;

        let Some(booking) = self.repository.find_booking(booking_id).await? else {
            return Ok(not_found(booking_id));
        };

        let now = self.clock.now();
        if !booking.is_syncable(now) {
            debug!(status = %booking.status, "booking not eligible for calendar sync");
            return Ok(SyncResult::rejected(
                booking_id,
                SyncFailure::InvalidState { status: booking.status },
            ));
        }

        let targets = self.resolve_targets(&booking).await;
        if targets.is_empty() {
            debug!("no participant has a connected calendar");
            return Ok(SyncResult::rejected(booking_id, SyncFailure::NoTargets));
        }

        let outcomes = match booking.sync.external_event_id.as_deref() {
            None => self.create_on_targets(&targets, self.translator.translate(&booking)).await,
            Some(event_id) => {
                self.update_on_targets(&targets, event_id, self.translator.patch(&booking)).await
            }
        };

        if !outcomes.iter().any(|outcome| outcome.success) {
            warn!(targets = outcomes.len(), "calendar sync failed on every target");
            return Ok(SyncResult::all_targets_failed(
                booking_id,
                booking.sync.external_event_id,
                outcomes,
            ));
        }

        let external_id = match booking.sync.external_event_id {
            Some(existing) => Some(existing),
            None => self.claim_created_event_id(booking_id, &outcomes).await?,
        };

        self.repository
            .save_sync_state(booking_id, &SyncState::synced_at(external_id.clone(), now))
            .await?;

        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        let failed = outcomes.len() - succeeded;
        info!(succeeded, failed, external_id = ?external_id, "booking synchronized");
        let message =
            format!("synchronized with {succeeded} of {} calendars ({failed} failed)", outcomes.len());
        Ok(SyncResult::succeeded(booking_id, message, external_id, outcomes))
    }

    /// Delete the booking's event from every target calendar
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn remove(&self, booking_id: BookingId) -> Result<SyncResult> {
        let _guard = self.locks.acquire(booking_id).await;

        let Some(booking) = self.repository.find_booking(booking_id).await? else {
            return Ok(not_found(booking_id));
        };

        let Some(event_id) = booking.sync.external_event_id.clone() else {
            return Ok(SyncResult::rejected(booking_id, SyncFailure::NotSynced));
        };

        let targets = self.resolve_targets(&booking).await;
        if targets.is_empty() {
            return Ok(SyncResult::rejected(booking_id, SyncFailure::NoTargets));
        }

        let outcomes = self.delete_on_targets(&targets, &event_id).await;
        if !outcomes.iter().any(|outcome| outcome.success) {
            warn!(targets = outcomes.len(), "calendar delete failed on every target");
            return Ok(SyncResult::all_targets_failed(booking_id, Some(event_id), outcomes));
        }

        let now = self.clock.now();
        self.repository.save_sync_state(booking_id, &SyncState::cleared_at(now)).await?;

        let succeeded = outcomes.iter().filter(|outcome| outcome.success).count();
        info!(succeeded, total = outcomes.len(), "booking removed from calendars");
        Ok(SyncResult::succeeded(
            booking_id,
            format!("removed from {succeeded} of {} calendars", outcomes.len()),
            None,
            outcomes,
        ))
    }

    /// Participants whose credentials currently yield a usable token.
    ///
    /// Credential lookups that error are treated as "not connected".
    pub async fn resolve_targets(&self, booking: &Booking) -> Vec<SyncTarget> {
        let mut participants: Vec<(ParticipantRole, String)> = Vec::with_capacity(2);
        for (role, participant) in booking.participants() {
            // One account on both sides gets a single target.
            if participants.iter().all(|(_, user_id)| user_id != &participant.user_id) {
                participants.push((role, participant.user_id.clone()));
            }
        }

        let lookups = participants.into_iter().map(|(role, user_id)| async move {
            match self.credentials.get_valid_token(&user_id).await {
                Ok(Some(token)) => Some(SyncTarget {
                    role,
                    client: self.clients.client_for(&token),
                    user_id,
                }),
                Ok(None) => {
                    debug!(%role, %user_id, "calendar not connected");
                    None
                }
                Err(err) => {
                    warn!(%role, %user_id, error = %err, "credential lookup failed");
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn create_on_targets(
        &self,
        targets: &[SyncTarget],
        event: ExternalEvent,
    ) -> Vec<TargetOutcome> {
        let event = &event;
        self.fan_out(targets, SyncOperation::Create, |client| async move {
            client.create_event(event).await.map(Some)
        })
        .await
    }

    async fn update_on_targets(
        &self,
        targets: &[SyncTarget],
        event_id: &str,
        patch: EventPatch,
    ) -> Vec<TargetOutcome> {
        let patch = &patch;
        self.fan_out(targets, SyncOperation::Update, |client| async move {
            client.update_event(event_id, patch).await.map(|()| None)
        })
        .await
    }

    async fn delete_on_targets(&self, targets: &[SyncTarget], event_id: &str) -> Vec<TargetOutcome> {
        self.fan_out(targets, SyncOperation::Delete, |client| async move {
            match client.delete_event(event_id).await {
                // Already gone on this calendar: the desired end state holds.
                Err(StageSyncError::NotFound(_)) => Ok(None),
                other => other.map(|()| None),
            }
        })
        .await
    }

    /// Run `call` against every target, bounded by the worker count,
    /// returning outcomes in target order.
    async fn fan_out<F, Fut>(
        &self,
        targets: &[SyncTarget],
        operation: SyncOperation,
        call: F,
    ) -> Vec<TargetOutcome>
    where
        F: Fn(Arc<dyn CalendarClient>) -> Fut,
        Fut: std::future::Future<Output = Result<Option<String>>>,
    {
        stream::iter(targets)
            .map(|target| {
                let pending = call(Arc::clone(&target.client));
                async move {
                    match pending.await {
                        Ok(external_id) => TargetOutcome {
                            role: target.role,
                            user_id: target.user_id.clone(),
                            operation,
                            success: true,
                            external_id,
                            error: None,
                        },
                        Err(err) => {
                            warn!(
                                role = %target.role,
                                user_id = %target.user_id,
                                %operation,
                                error = %err,
                                "calendar call failed"
                            );
                            TargetOutcome {
                                role: target.role,
                                user_id: target.user_id.clone(),
                                operation,
                                success: false,
                                external_id: None,
                                error: Some(err.to_string()),
                            }
                        }
                    }
                }
            })
            .buffered(self.workers)
            .collect()
            .await
    }

    /// Persist the first created id; later ids are logged and dropped.
    async fn claim_created_event_id(
        &self,
        booking_id: BookingId,
        outcomes: &[TargetOutcome],
    ) -> Result<Option<String>> {
        let mut created = outcomes.iter().filter_map(|outcome| {
            outcome.external_id.as_deref().map(|id| (outcome.role, id))
        });

        let Some((role, first_id)) = created.next() else {
            return Ok(None);
        };
        for (other_role, other_id) in created {
            warn!(
                kept_role = %role,
                dropped_role = %other_role,
                dropped_external_id = other_id,
                "booking stores one external id; additional event id not retained"
            );
        }

        if self.repository.claim_external_event_id(booking_id, first_id).await? {
            return Ok(Some(first_id.to_string()));
        }

        // Someone else stored an id between our read and write; theirs stands.
        let stored = self
            .repository
            .find_booking(booking_id)
            .await?
            .and_then(|booking| booking.sync.external_event_id);
        warn!(
            created_external_id = first_id,
            stored_external_id = ?stored,
            "external id already claimed by a concurrent sync"
        );
        Ok(stored.or_else(|| Some(first_id.to_string())))
    }
}

fn not_found(booking_id: BookingId) -> SyncResult {
    SyncResult::rejected(
        booking_id,
        SyncFailure::NotFound { message: format!("booking {booking_id}") },
    )
}
