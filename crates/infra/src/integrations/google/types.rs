//! Google Calendar v3 wire types and conversions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stagesync_domain::{
    Attendee, CalendarAccess, EventPatch, EventStatus, EventTime, ExternalEvent, Reminder,
    ReminderChannel, ResponseStatus, StageSyncError,
};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: GoogleDateTime,
    pub end: GoogleDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<GoogleAttendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<GoogleReminders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

/// `events.patch` body: only the fields being changed are serialized, so the
/// server keeps everything else on the stored event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<GoogleDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<GoogleDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<GoogleAttendee>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<GoogleReminders>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

/// Either a timed instant or an all-day date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAttendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<ResponseStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<GoogleReminder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleReminder {
    pub method: ReminderChannel,
    pub minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarListEntry {
    pub id: String,
    pub summary: Option<String>,
    pub summary_override: Option<String>,
    pub time_zone: Option<String>,
}

impl From<GoogleCalendarListEntry> for CalendarAccess {
    fn from(entry: GoogleCalendarListEntry) -> Self {
        let display_name =
            entry.summary_override.or(entry.summary).unwrap_or_else(|| entry.id.clone());
        Self {
            calendar_id: entry.id,
            display_name,
            time_zone: entry.time_zone.unwrap_or_else(|| "UTC".to_string()),
        }
    }
}

impl From<&ExternalEvent> for GoogleEvent {
    fn from(event: &ExternalEvent) -> Self {
        Self {
            id: None,
            summary: Some(event.title.clone()),
            description: event.description.clone(),
            location: event.location.clone(),
            start: GoogleDateTime::from(&event.start),
            end: GoogleDateTime::from(&event.end),
            attendees: wire_attendees(&event.attendees),
            reminders: Some(wire_reminders(&event.reminders)),
            status: Some(status_name(event.status).to_string()),
            color_id: event.color_id.clone(),
        }
    }
}

impl From<&EventPatch> for GoogleEventPatch {
    fn from(patch: &EventPatch) -> Self {
        Self {
            summary: patch.title.clone(),
            description: patch.description.clone(),
            location: patch.location.clone(),
            start: patch.start.as_ref().map(GoogleDateTime::from),
            end: patch.end.as_ref().map(GoogleDateTime::from),
            attendees: patch.attendees.as_deref().map(wire_attendees),
            reminders: patch.reminders.as_deref().map(wire_reminders),
            status: patch.status.map(|status| status_name(status).to_string()),
            color_id: patch.color_id.clone(),
        }
    }
}

fn wire_attendees(attendees: &[Attendee]) -> Vec<GoogleAttendee> {
    attendees
        .iter()
        .map(|attendee| GoogleAttendee {
            email: attendee.email.clone(),
            display_name: attendee.display_name.clone(),
            response_status: Some(attendee.response_status),
        })
        .collect()
}

/// No explicit reminders means the calendar's defaults.
fn wire_reminders(reminders: &[Reminder]) -> GoogleReminders {
    GoogleReminders {
        use_default: reminders.is_empty(),
        overrides: reminders
            .iter()
            .map(|r| GoogleReminder { method: r.channel, minutes: r.minutes_before })
            .collect(),
    }
}

impl From<&EventTime> for GoogleDateTime {
    fn from(time: &EventTime) -> Self {
        Self {
            date_time: Some(time.instant),
            date: None,
            time_zone: Some(time.time_zone.clone()),
        }
    }
}

impl GoogleDateTime {
    fn into_event_time(self, field: &str) -> Result<EventTime, StageSyncError> {
        let time_zone = self.time_zone.unwrap_or_else(|| "UTC".to_string());
        if let Some(instant) = self.date_time {
            return Ok(EventTime::new(instant, time_zone));
        }
        // All-day events carry a bare date; treat it as midnight UTC.
        if let Some(date) = self.date {
            let instant = date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()).ok_or_else(
                || StageSyncError::Provider(format!("event {field} date out of range")),
            )?;
            return Ok(EventTime::new(instant, time_zone));
        }
        Err(StageSyncError::Provider(format!("event {field} has neither dateTime nor date")))
    }
}

impl TryFrom<GoogleEvent> for ExternalEvent {
    type Error = StageSyncError;

    fn try_from(event: GoogleEvent) -> Result<Self, Self::Error> {
        let start = event.start.into_event_time("start")?;
        let end = event.end.into_event_time("end")?;

        let reminders = event
            .reminders
            .map(|reminders| {
                reminders
                    .overrides
                    .into_iter()
                    .map(|r| Reminder { channel: r.method, minutes_before: r.minutes })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: event.id,
            title: event.summary.unwrap_or_default(),
            description: event.description,
            location: event.location,
            start,
            end,
            attendees: event
                .attendees
                .into_iter()
                .map(|attendee| Attendee {
                    email: attendee.email,
                    display_name: attendee.display_name,
                    response_status: attendee.response_status.unwrap_or(ResponseStatus::NeedsAction),
                })
                .collect(),
            reminders,
            status: parse_status(event.status.as_deref()),
            color_id: event.color_id,
        })
    }
}

/// Convert a page of listed events, dropping any the engine cannot read.
pub fn convert_listed(items: Vec<GoogleEvent>) -> Vec<ExternalEvent> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.clone();
            ExternalEvent::try_from(item)
                .map_err(|err| warn!(event_id = ?id, error = %err, "skipping unreadable event"))
                .ok()
        })
        .collect()
}

fn status_name(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Confirmed => "confirmed",
        EventStatus::Tentative => "tentative",
        EventStatus::Cancelled => "cancelled",
    }
}

fn parse_status(raw: Option<&str>) -> EventStatus {
    match raw {
        Some("tentative") => EventStatus::Tentative,
        Some("cancelled") => EventStatus::Cancelled,
        _ => EventStatus::Confirmed,
    }
}
