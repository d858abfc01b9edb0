//! In-memory booking repository

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stagesync_core::{BookingFilter, BookingRepository};
use stagesync_domain::{Booking, BookingId, Result as DomainResult, StageSyncError, SyncState};

/// In-memory mock for `BookingRepository`.
///
/// Records every sync-state write and honours the compare-and-set contract
/// of `claim_external_event_id`. `fail_reads` simulates the store going away.
#[derive(Default, Clone)]
pub struct MockBookingRepository {
    bookings: Arc<Mutex<HashMap<BookingId, Booking>>>,
    saves: Arc<Mutex<Vec<(BookingId, SyncState)>>>,
    claims: Arc<Mutex<Vec<(BookingId, String)>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockBookingRepository {
    pub fn insert(&self, booking: Booking) {
        self.bookings.lock().unwrap().insert(booking.id, booking);
    }

    pub fn get(&self, id: BookingId) -> Booking {
        self.bookings.lock().unwrap()[&id].clone()
    }

    /// Sync-state writes in call order.
    pub fn saves(&self) -> Vec<(BookingId, SyncState)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn claims(&self) -> Vec<(BookingId, String)> {
        self.claims.lock().unwrap().clone()
    }

    /// Make every subsequent call fail with a database error.
    pub fn fail_reads(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> DomainResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StageSyncError::Database("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MockBookingRepository {
    async fn find_booking(&self, id: BookingId) -> DomainResult<Option<Booking>> {
        self.check_available()?;
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn find_bookings(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        self.check_available()?;
        let mut found: Vec<_> =
            self.bookings.lock().unwrap().values().filter(|b| filter.matches(b)).cloned().collect();
        found.sort_by_key(|b| (b.scheduled_start, b.id));
        Ok(found)
    }

    async fn save_sync_state(&self, id: BookingId, state: &SyncState) -> DomainResult<()> {
        self.check_available()?;
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| StageSyncError::NotFound(format!("booking {id}")))?;
        booking.sync = state.clone();
        self.saves.lock().unwrap().push((id, state.clone()));
        Ok(())
    }

    async fn claim_external_event_id(&self, id: BookingId, event_id: &str) -> DomainResult<bool> {
        self.check_available()?;
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| StageSyncError::NotFound(format!("booking {id}")))?;
        if booking.sync.external_event_id.is_some() {
            return Ok(false);
        }
        booking.sync.external_event_id = Some(event_id.to_string());
        self.claims.lock().unwrap().push((id, event_id.to_string()));
        Ok(true)
    }
}
