//! Application constants
//!
//! Values fixed by the calendar representation of a booking. Tunables that an
//! operator may want to change live in [`crate::config`] instead.

// Calendar event presentation
pub const SHOW_EVENT_COLOR_ID: &str = "11";
pub const SHOW_TITLE_PREFIX: &str = "Show";
pub const DESCRIPTION_HEADER: &str = "🎵 SHOW BOOKING";
pub const DESCRIPTION_FOOTER_PREFIX: &str = "Booking ID:";
pub const PERFORMER_ATTENDEE_SUFFIX: &str = "(performer)";
pub const VENUE_ATTENDEE_SUFFIX: &str = "(venue)";

// Reminder tiers applied when an event is first created
pub const REMINDER_DAY_BEFORE_MINUTES: u32 = 24 * 60;
pub const REMINDER_HOUR_BEFORE_MINUTES: u32 = 60;
pub const REMINDER_QUARTER_HOUR_MINUTES: u32 = 15;

// Sync defaults
pub const DEFAULT_CONFLICT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_CONFLICT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 7;
pub const DEFAULT_COVERAGE_THRESHOLD_PERCENT: u8 = 80;
pub const DEFAULT_DISPLAY_TIME_ZONE: &str = "America/Sao_Paulo";

// Google Calendar defaults
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
