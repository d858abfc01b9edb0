//! Booking → external calendar event translation
//!
//! Pure and deterministic. The description is shown verbatim to both parties
//! inside their calendars, so section order and presence rules are fixed:
//!
//! 1. header
//! 2. date and time (display zone)
//! 3. duration
//! 4. performer
//! 5. venue
//! 6. agreed value, if any
//! 7. free-text details, if any
//! 8. technical needs, if any
//! 9. requester notes, if any
//! 10. booking id footer

use chrono_tz::Tz;
use stagesync_domain::constants::{
    DESCRIPTION_FOOTER_PREFIX, DESCRIPTION_HEADER, PERFORMER_ATTENDEE_SUFFIX,
    REMINDER_DAY_BEFORE_MINUTES, REMINDER_HOUR_BEFORE_MINUTES, REMINDER_QUARTER_HOUR_MINUTES,
    SHOW_EVENT_COLOR_ID, SHOW_TITLE_PREFIX, VENUE_ATTENDEE_SUFFIX,
};
use stagesync_domain::{
    Address, Attendee, Booking, EventPatch, EventStatus, EventTime, ExternalEvent,
    ParticipantRole, Reminder, ReminderChannel, ResponseStatus, StageSyncError, SyncSettings,
    TechnicalNeeds,
};

/// Builds the calendar representation of a booking
#[derive(Debug, Clone, Copy)]
pub struct EventTranslator {
    time_zone: Tz,
}

impl Default for EventTranslator {
    fn default() -> Self {
        Self { time_zone: chrono_tz::America::Sao_Paulo }
    }
}

impl EventTranslator {
    /// Translator rendering times in `time_zone`.
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    /// Translator using the configured display zone.
    pub fn from_settings(settings: &SyncSettings) -> stagesync_domain::Result<Self> {
        let time_zone = settings.display_time_zone.parse::<Tz>().map_err(|e| {
            StageSyncError::Config(format!(
                "invalid display_time_zone '{}': {e}",
                settings.display_time_zone
            ))
        })?;
        Ok(Self { time_zone })
    }

    /// Zone used for human-readable times.
    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Full event used on the create path.
    pub fn translate(&self, booking: &Booking) -> ExternalEvent {
        let zone = self.time_zone.name();
        ExternalEvent {
            id: None,
            title: title(booking),
            description: Some(self.description(booking)),
            location: booking.venue_address.as_ref().map(location),
            start: EventTime::new(booking.scheduled_start, zone),
            end: EventTime::new(booking.scheduled_end(), zone),
            attendees: attendees(booking),
            reminders: default_reminders(),
            status: EventStatus::Confirmed,
            color_id: Some(SHOW_EVENT_COLOR_ID.to_string()),
        }
    }

    /// Patch used on the update path; reminders are left untouched.
    pub fn patch(&self, booking: &Booking) -> EventPatch {
        EventPatch::from(self.translate(booking))
    }

    fn description(&self, booking: &Booking) -> String {
        let local_start = booking.scheduled_start.with_timezone(&self.time_zone);
        let mut sections = vec![
            DESCRIPTION_HEADER.to_string(),
            format!("📅 Date: {}", local_start.format("%d/%m/%Y at %H:%M")),
            format!("⏱️ Duration: {}", format_duration(booking.duration_minutes)),
        ];

        if let Some(name) = non_empty(&booking.performer.display_name) {
            sections.push(format!("🎤 Performer: {name}"));
        }
        if let Some(name) = non_empty(&booking.venue.display_name) {
            sections.push(format!("📍 Venue: {name}"));
        }
        if let Some(value) = booking.agreed_value {
            sections.push(format!("💰 Value: {value:.2}"));
        }
        if let Some(details) = booking.event_description.as_deref().and_then(non_empty) {
            sections.push(format!("📝 Details: {details}"));
        }
        if let Some(block) = technical_needs(&booking.technical_needs) {
            sections.push(block);
        }
        if let Some(notes) = booking.requester_notes.as_deref().and_then(non_empty) {
            sections.push(format!("💬 Notes: {notes}"));
        }
        sections.push(format!("{DESCRIPTION_FOOTER_PREFIX} {}", booking.id));

        sections.join("\n")
    }
}

fn title(booking: &Booking) -> String {
    match booking.title.as_deref().and_then(non_empty) {
        Some(title) => title.to_string(),
        None => format!(
            "{SHOW_TITLE_PREFIX}: {} - {}",
            booking.performer.display_name, booking.venue.display_name
        ),
    }
}

fn technical_needs(needs: &TechnicalNeeds) -> Option<String> {
    if needs.is_empty() {
        return None;
    }
    let mut lines = vec!["🔧 Technical needs:".to_string()];
    if needs.sound_required {
        lines.push("- Sound system required".to_string());
    }
    if needs.lighting_required {
        lines.push("- Lighting required".to_string());
    }
    if !needs.instruments.is_empty() {
        lines.push(format!("- Instruments: {}", needs.instruments.join(", ")));
    }
    Some(lines.join("\n"))
}

/// `street[, number][, complement] - neighborhood, city/state[ - CEP: code]`
pub fn location(address: &Address) -> String {
    let mut out = address.street.clone();
    for part in [&address.number, &address.complement] {
        if let Some(part) = part.as_deref().and_then(non_empty) {
            out.push_str(", ");
            out.push_str(part);
        }
    }
    out.push_str(&format!(" - {}, {}/{}", address.neighborhood, address.city, address.state));
    if let Some(code) = address.postal_code.as_deref().and_then(non_empty) {
        out.push_str(&format!(" - CEP: {code}"));
    }
    out
}

fn attendees(booking: &Booking) -> Vec<Attendee> {
    booking
        .participants()
        .into_iter()
        .filter_map(|(role, participant)| {
            let email = participant.email.as_deref().and_then(non_empty)?;
            let suffix = match role {
                ParticipantRole::Performer => PERFORMER_ATTENDEE_SUFFIX,
                ParticipantRole::Venue => VENUE_ATTENDEE_SUFFIX,
            };
            Some(Attendee {
                email: email.to_string(),
                display_name: Some(format!("{} {suffix}", participant.display_name)),
                response_status: ResponseStatus::Accepted,
            })
        })
        .collect()
}

/// Day-before mail, hour-before alert, quarter-hour alert.
pub fn default_reminders() -> Vec<Reminder> {
    vec![
        Reminder { channel: ReminderChannel::Email, minutes_before: REMINDER_DAY_BEFORE_MINUTES },
        Reminder { channel: ReminderChannel::Popup, minutes_before: REMINDER_HOUR_BEFORE_MINUTES },
        Reminder { channel: ReminderChannel::Popup, minutes_before: REMINDER_QUARTER_HOUR_MINUTES },
    ]
}

fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}min"),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
