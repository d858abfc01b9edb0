//! Detection of bookings that collide with events already on the calendar

use std::sync::Arc;

use chrono::{DateTime, Utc};
use stagesync_domain::{
    Booking, BookingStatus, ConflictKind, ConflictRecord, ConflictReport, ExternalEvent, Result,
    SyncSettings, TimeWindow,
};
use tracing::{debug, instrument, warn};

use super::ports::{BookingFilter, BookingRepository};
use crate::calendar_ports::{CalendarClientFactory, CredentialProvider};
use crate::clock::{Clock, SystemClock};

/// Half-open interval intersection; touching endpoints do not overlap.
pub fn intervals_overlap(
    first_start: DateTime<Utc>,
    first_end: DateTime<Utc>,
    second_start: DateTime<Utc>,
    second_end: DateTime<Utc>,
) -> bool {
    first_start < second_end && second_start < first_end
}

/// Pair every booking with every overlapping external event.
///
/// The booking's own mirrored event is never reported against it.
pub fn detect_conflicts(bookings: &[Booking], events: &[ExternalEvent]) -> Vec<ConflictRecord> {
    let mut conflicts = Vec::new();
    for booking in bookings {
        let (start, end) = (booking.scheduled_start, booking.scheduled_end());
        for event in events {
            let is_own_event = matches!(
                (&event.id, &booking.sync.external_event_id),
                (Some(event_id), Some(own_id)) if event_id == own_id
            );
            if is_own_event {
                continue;
            }

            let (event_start, event_end) = (event.start.instant, event.end.instant);
            if !intervals_overlap(start, end, event_start, event_end) {
                continue;
            }

            let kind = if start == event_start && end == event_end {
                ConflictKind::ExactMatch
            } else {
                ConflictKind::Overlap
            };
            conflicts.push(ConflictRecord {
                booking_id: booking.id,
                external_event_id: event.id.clone(),
                event_title: event.title.clone(),
                anchor: start.max(event_start),
                kind,
            });
        }
    }
    conflicts
}

/// Compares a user's bookings with their connected calendar
pub struct ConflictDetector {
    repository: Arc<dyn BookingRepository>,
    credentials: Arc<dyn CredentialProvider>,
    clients: Arc<dyn CalendarClientFactory>,
    clock: Arc<dyn Clock>,
    window_days: i64,
    page_size: usize,
}

impl ConflictDetector {
    /// Create a detector with the system clock and default settings
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        credentials: Arc<dyn CredentialProvider>,
        clients: Arc<dyn CalendarClientFactory>,
    ) -> Self {
        let settings = SyncSettings::default();
        Self {
            repository,
            credentials,
            clients,
            clock: Arc::new(SystemClock),
            window_days: settings.conflict_window_days,
            page_size: settings.conflict_page_size,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply conflict window and page size from settings.
    pub fn with_settings(mut self, settings: &SyncSettings) -> Self {
        self.window_days = settings.conflict_window_days;
        self.page_size = settings.conflict_page_size;
        self
    }

    /// Default window: now until `conflict_window_days` ahead.
    pub fn default_window(&self) -> TimeWindow {
        TimeWindow::upcoming(self.clock.now(), self.window_days)
    }

    /// Report overlaps between the user's syncable bookings and calendar
    /// events inside `window`.
    ///
    /// An unconnected account or a failed calendar fetch yields an empty
    /// report. Only a booking-store failure is returned as `Err`.
    #[instrument(skip(self))]
    pub async fn check(&self, user_id: &str, window: Option<TimeWindow>) -> Result<ConflictReport> {
        let window = window.unwrap_or_else(|| self.default_window());

        let events = match self.credentials.get_valid_token(user_id).await {
            Ok(Some(token)) => {
                let client = self.clients.client_for(&token);
                match client.list_events(&window, self.page_size).await {
                    Ok(events) => events,
                    Err(err) => {
                        warn!(error = %err, "could not list calendar events; skipping conflict check");
                        return Ok(ConflictReport::default());
                    }
                }
            }
            Ok(None) => {
                debug!("calendar not connected; skipping conflict check");
                return Ok(ConflictReport::default());
            }
            Err(err) => {
                warn!(error = %err, "credential lookup failed; skipping conflict check");
                return Ok(ConflictReport::default());
            }
        };

        let filter = BookingFilter::for_user(user_id)
            .with_statuses(BookingStatus::SYNCABLE)
            .starting_between(window.start, window.end);
        let bookings = self.repository.find_bookings(&filter).await?;

        let conflicts = detect_conflicts(&bookings, &events);
        debug!(
            bookings = bookings.len(),
            events = events.len(),
            conflicts = conflicts.len(),
            "conflict check finished"
        );
        Ok(ConflictReport::from_records(conflicts))
    }
}
