//! Sync coverage statistics

use std::sync::Arc;

use chrono::{DateTime, Utc};
use stagesync_domain::{Booking, Result, SyncStats};
use tracing::instrument;

use super::ports::{BookingFilter, BookingRepository};
use crate::clock::{Clock, SystemClock};

/// Coverage of `bookings` at `now`.
///
/// Counts cover syncable, future bookings; `last_sync_at` is the latest sync
/// stamp over every booking passed in.
pub fn compute_stats(bookings: &[Booking], now: DateTime<Utc>) -> SyncStats {
    let eligible: Vec<&Booking> = bookings.iter().filter(|b| b.is_syncable(now)).collect();

    let total = eligible.len();
    let synced = eligible.iter().filter(|b| b.sync.synced).count();
    let sync_errors = eligible.iter().filter(|b| b.sync.has_error()).count();
    let last_sync_at = bookings.iter().filter_map(|b| b.sync.last_sync_at).max();

    SyncStats {
        total,
        synced,
        unsynced: total - synced,
        sync_errors,
        last_sync_at,
        sync_percentage: percentage(synced, total),
    }
}

/// `round(100 * part / whole)`, zero for an empty whole.
fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

/// Computes [`SyncStats`] for a user from the booking store
pub struct StatisticsAggregator {
    repository: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl StatisticsAggregator {
    /// Create an aggregator with the system clock
    pub fn new(repository: Arc<dyn BookingRepository>) -> Self {
        Self { repository, clock: Arc::new(SystemClock) }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Load the user's bookings and summarize them as of now.
    #[instrument(skip(self))]
    pub async fn stats(&self, user_id: &str) -> Result<SyncStats> {
        let bookings = self.repository.find_bookings(&BookingFilter::for_user(user_id)).await?;
        Ok(compute_stats(&bookings, self.clock.now()))
    }
}
