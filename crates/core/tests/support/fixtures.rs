//! Booking fixtures

use chrono::{DateTime, Duration, TimeZone, Utc};
use stagesync_domain::{
    Booking, BookingStatus, EventStatus, EventTime, ExternalEvent, Participant, SyncState,
    TechnicalNeeds,
};
use uuid::Uuid;

/// Fixed "now" shared by every scenario.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Builder for bookings between `band` (performer) and `club` (venue).
#[derive(Clone)]
pub struct BookingBuilder {
    booking: Booking,
}

impl BookingBuilder {
    pub fn new(id: u128) -> Self {
        Self {
            booking: Booking {
                id: Uuid::from_u128(id),
                title: None,
                status: BookingStatus::Accepted,
                scheduled_start: Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
                duration_minutes: 120,
                performer: Participant {
                    user_id: "band".into(),
                    display_name: "The Night Owls".into(),
                    email: Some("owls@example.com".into()),
                },
                venue: Participant {
                    user_id: "club".into(),
                    display_name: "Blue Note".into(),
                    email: Some("bookings@bluenote.example".into()),
                },
                venue_address: None,
                agreed_value: Some(1500.0),
                event_description: None,
                technical_needs: TechnicalNeeds::default(),
                requester_notes: None,
                sync: SyncState::default(),
                last_modified_at: now() - Duration::days(3),
            },
        }
    }

    pub fn status(mut self, status: BookingStatus) -> Self {
        self.booking.status = status;
        self
    }

    pub fn starts_at(mut self, start: DateTime<Utc>) -> Self {
        self.booking.scheduled_start = start;
        self
    }

    pub fn starts_in_days(mut self, days: i64) -> Self {
        self.booking.scheduled_start = now() + Duration::days(days);
        self
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.booking.duration_minutes = minutes;
        self
    }

    /// Synced with `external_id`, last sync `days_ago` days before now.
    pub fn synced(mut self, external_id: &str, days_ago: i64) -> Self {
        self.booking.sync =
            SyncState::synced_at(Some(external_id.to_string()), now() - Duration::days(days_ago));
        self
    }

    /// Carries an external id from an attempt that did not stick.
    pub fn sync_error(mut self, external_id: &str) -> Self {
        self.booking.sync = SyncState {
            external_event_id: Some(external_id.to_string()),
            synced: false,
            last_sync_at: None,
        };
        self
    }

    pub fn modified_days_ago(mut self, days: i64) -> Self {
        self.booking.last_modified_at = now() - Duration::days(days);
        self
    }

    pub fn venue_user(mut self, user_id: &str) -> Self {
        self.booking.venue.user_id = user_id.to_string();
        self
    }

    pub fn build(self) -> Booking {
        self.booking
    }
}

/// An event the user created directly in their calendar.
pub fn external_event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ExternalEvent {
    ExternalEvent {
        id: Some(id.to_string()),
        title: format!("Private event {id}"),
        description: None,
        location: None,
        start: EventTime::new(start, "UTC"),
        end: EventTime::new(end, "UTC"),
        attendees: Vec::new(),
        reminders: Vec::new(),
        status: EventStatus::Confirmed,
        color_id: None,
    }
}

/// An event far outside any booking, for update/delete targets.
pub fn calendar_event(id: &str) -> ExternalEvent {
    let start = now() + Duration::days(200);
    external_event(id, start, start + Duration::hours(1))
}
