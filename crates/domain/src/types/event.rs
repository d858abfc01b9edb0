//! External calendar event representation
//!
//! Provider-neutral shape of an event as the sync engine sends and receives
//! it. Adapters convert to and from their wire formats.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Point in time plus the zone it should be displayed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    pub instant: DateTime<Utc>,
    pub time_zone: String,
}

impl EventTime {
    pub fn new(instant: DateTime<Utc>, time_zone: impl Into<String>) -> Self {
        Self { instant, time_zone: time_zone.into() }
    }
}

/// Invitation response of an attendee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    NeedsAction,
    Declined,
    Tentative,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub display_name: Option<String>,
    pub response_status: ResponseStatus,
}

/// Delivery channel of a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    /// Notification delivered out of band (mail)
    Email,
    /// On-device alert
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub channel: ReminderChannel,
    pub minutes_before: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

/// A calendar event as held by the external system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// Assigned by the external system; `None` before creation.
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<Attendee>,
    pub reminders: Vec<Reminder>,
    pub status: EventStatus,
    pub color_id: Option<String>,
}

/// Partial event used by updates
///
/// `None` fields are left as they are on the remote event. The reconciler
/// never sends reminders on update so user-adjusted reminders survive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub attendees: Option<Vec<Attendee>>,
    pub reminders: Option<Vec<Reminder>>,
    pub status: Option<EventStatus>,
    pub color_id: Option<String>,
}

impl EventPatch {
    /// Merge the supplied fields onto `existing`.
    pub fn apply_to(&self, existing: &ExternalEvent) -> ExternalEvent {
        let mut merged = existing.clone();
        if let Some(title) = &self.title {
            merged.title.clone_from(title);
        }
        if self.description.is_some() {
            merged.description.clone_from(&self.description);
        }
        if self.location.is_some() {
            merged.location.clone_from(&self.location);
        }
        if let Some(start) = &self.start {
            merged.start = start.clone();
        }
        if let Some(end) = &self.end {
            merged.end = end.clone();
        }
        if let Some(attendees) = &self.attendees {
            merged.attendees.clone_from(attendees);
        }
        if let Some(reminders) = &self.reminders {
            merged.reminders.clone_from(reminders);
        }
        if let Some(status) = self.status {
            merged.status = status;
        }
        if self.color_id.is_some() {
            merged.color_id.clone_from(&self.color_id);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<ExternalEvent> for EventPatch {
    /// Every field of `event` except reminders.
    fn from(event: ExternalEvent) -> Self {
        Self {
            title: Some(event.title),
            description: event.description,
            location: event.location,
            start: Some(event.start),
            end: Some(event.end),
            attendees: Some(event.attendees),
            reminders: None,
            status: Some(event.status),
            color_id: event.color_id,
        }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now, now + days)`
    pub fn upcoming(now: DateTime<Utc>, days: i64) -> Self {
        Self { start: now, end: now + Duration::days(days) }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Result of probing an external calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarAccess {
    pub calendar_id: String,
    pub display_name: String,
    pub time_zone: String,
}
