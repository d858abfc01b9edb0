//! Keyed exclusion for per-booking reconciliation
//!
//! Two concurrent reconciles of the same booking could otherwise both see an
//! empty `external_event_id`, both create remote events, and lose one id.
//! Holding the booking's guard for the whole reconcile/remove serialises
//! them; different bookings never contend.

use std::sync::Arc;

use dashmap::DashMap;
use stagesync_domain::BookingId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of async mutexes keyed by booking id
#[derive(Debug, Default, Clone)]
pub struct BookingLocks {
    locks: Arc<DashMap<BookingId, Arc<Mutex<()>>>>,
}

impl BookingLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: BookingId) -> BookingGuard {
        let lock = self.locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        let guard = lock.lock_owned().await;
        BookingGuard { id, locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// Number of bookings with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while a booking is being reconciled
///
/// Dropping the last guard for a booking removes its table entry.
pub struct BookingGuard {
    id: BookingId,
    locks: Arc<DashMap<BookingId, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BookingGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself still references the mutex: nobody is waiting.
        self.locks.remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
