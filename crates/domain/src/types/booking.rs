//! Booking records as seen by the calendar sync engine
//!
//! Bookings are owned by the booking subsystem. The sync engine reads the
//! content fields and writes only [`SyncState`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// Booking identifier
pub type BookingId = Uuid;

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    InNegotiation,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl_domain_status_conversions!(BookingStatus {
    Pending => "pending",
    InNegotiation => "in_negotiation",
    Accepted => "accepted",
    Rejected => "rejected",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl BookingStatus {
    /// Statuses that get an external calendar representation.
    pub const SYNCABLE: [Self; 2] = [Self::Accepted, Self::InNegotiation];

    /// Statuses whose external event must be removed.
    pub const RETIRED: [Self; 2] = [Self::Cancelled, Self::Rejected];

    pub fn is_syncable(self) -> bool {
        Self::SYNCABLE.contains(&self)
    }

    pub fn is_retired(self) -> bool {
        Self::RETIRED.contains(&self)
    }
}

/// Which side of the engagement a participant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Performer,
    Venue,
}

impl_domain_status_conversions!(ParticipantRole {
    Performer => "performer",
    Venue => "venue",
});

/// One party of a booking and the account it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Account owning this side; used to resolve calendar credentials.
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// Street address of the venue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
}

/// Technical requirements attached to a booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalNeeds {
    pub sound_required: bool,
    pub lighting_required: bool,
    pub instruments: Vec<String>,
}

impl TechnicalNeeds {
    pub fn is_empty(&self) -> bool {
        !self.sound_required && !self.lighting_required && self.instruments.is_empty()
    }
}

/// Sync fields stored alongside the booking record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub external_event_id: Option<String>,
    pub synced: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl SyncState {
    /// State after at least one target accepted a create or update.
    pub fn synced_at(external_event_id: Option<String>, at: DateTime<Utc>) -> Self {
        Self { external_event_id, synced: true, last_sync_at: Some(at) }
    }

    /// State after the external event was removed.
    pub fn cleared_at(at: DateTime<Utc>) -> Self {
        Self { external_event_id: None, synced: false, last_sync_at: Some(at) }
    }

    /// `synced` without an external id is not a valid combination.
    pub fn is_consistent(&self) -> bool {
        !self.synced || self.external_event_id.is_some()
    }

    /// Sync was attempted at some point but is not currently in effect.
    pub fn has_error(&self) -> bool {
        self.external_event_id.is_some() && !self.synced
    }
}

/// An engagement between a performing group and a venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub title: Option<String>,
    pub status: BookingStatus,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub performer: Participant,
    pub venue: Participant,
    pub venue_address: Option<Address>,
    pub agreed_value: Option<f64>,
    pub event_description: Option<String>,
    pub technical_needs: TechnicalNeeds,
    pub requester_notes: Option<String>,
    pub sync: SyncState,
    pub last_modified_at: DateTime<Utc>,
}

impl Booking {
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled_start + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Eligible for an external representation at `now`.
    pub fn is_syncable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_syncable() && self.scheduled_start > now
    }

    /// Local content changed after the last successful sync.
    pub fn has_unsynced_changes(&self) -> bool {
        match self.sync.last_sync_at {
            Some(last_sync_at) => self.last_modified_at > last_sync_at,
            None => true,
        }
    }

    /// `user_id` is one of the two participants.
    pub fn involves(&self, user_id: &str) -> bool {
        self.performer.user_id == user_id || self.venue.user_id == user_id
    }

    pub fn participant(&self, role: ParticipantRole) -> &Participant {
        match role {
            ParticipantRole::Performer => &self.performer,
            ParticipantRole::Venue => &self.venue,
        }
    }

    /// Both participants in fixed order: performer first.
    pub fn participants(&self) -> [(ParticipantRole, &Participant); 2] {
        [(ParticipantRole::Performer, &self.performer), (ParticipantRole::Venue, &self.venue)]
    }
}
