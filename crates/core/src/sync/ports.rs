//! Port interfaces for booking persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stagesync_domain::{Booking, BookingId, BookingStatus, Result, SyncState};

/// Structured query over a user's bookings
///
/// Empty `statuses` means any status. Date bounds apply to `scheduled_start`
/// and form a half-open range; see [`BookingFilter::matches`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Bookings where this account is either participant
    pub user_id: Option<String>,
    pub statuses: Vec<BookingStatus>,
    /// Inclusive lower bound on `scheduled_start`
    pub starts_at_or_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `scheduled_start`
    pub starts_before: Option<DateTime<Utc>>,
}

impl BookingFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self { user_id: Some(user_id.into()), ..Self::default() }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = BookingStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn starting_between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.starts_at_or_after = Some(from);
        self.starts_before = Some(until);
        self
    }

    pub fn starting_after(mut self, from: DateTime<Utc>) -> Self {
        self.starts_at_or_after = Some(from);
        self
    }

    /// Reference semantics for repository implementations.
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(user_id) = &self.user_id {
            if !booking.involves(user_id) {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&booking.status) {
            return false;
        }
        if let Some(from) = self.starts_at_or_after {
            if booking.scheduled_start < from {
                return false;
            }
        }
        if let Some(until) = self.starts_before {
            if booking.scheduled_start >= until {
                return false;
            }
        }
        true
    }
}

/// Booking store as consumed by the sync engine
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Load a booking with both participants
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Load all bookings matching `filter`
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>>;

    /// Overwrite the sync fields of a booking
    async fn save_sync_state(&self, id: BookingId, state: &SyncState) -> Result<()>;

    /// Store `event_id` only if the booking has no external id yet.
    ///
    /// Returns `false` when another writer got there first.
    async fn claim_external_event_id(&self, id: BookingId, event_id: &str) -> Result<bool>;
}
