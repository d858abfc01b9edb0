//! Domain types and models

pub mod booking;
pub mod credentials;
pub mod event;
pub mod sync;

pub use booking::{
    Address, Booking, BookingId, BookingStatus, Participant, ParticipantRole, SyncState,
    TechnicalNeeds,
};
pub use credentials::AccessToken;
pub use event::{
    Attendee, CalendarAccess, EventPatch, EventStatus, EventTime, ExternalEvent, Reminder,
    ReminderChannel, ResponseStatus, TimeWindow,
};
pub use sync::{
    ActionLogEntry, BatchSyncReport, ConflictKind, ConflictRecord, ConflictReport,
    FullSyncReport, HealthDetails, HealthReport, SyncAction, SyncOperation, SyncResult,
    SyncStats, TargetOutcome,
};
