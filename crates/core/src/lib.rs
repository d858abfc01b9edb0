//! # StageSync Core
//!
//! Synchronization and conflict-detection engine - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for bookings, calendars and credentials
//! - Booking to event translation
//! - Reconciliation, batch sync, conflict detection, statistics and health
//!
//! ## Architecture Principles
//! - Only depends on `stagesync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar_ports;
pub mod clock;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use calendar_ports::{CalendarClient, CalendarClientFactory, CredentialProvider};
pub use clock::{Clock, SystemClock};
pub use sync::{
    BookingFilter, BookingRepository, ConflictDetector, EventTranslator, HealthMonitor,
    StatisticsAggregator, SyncOrchestrator, SyncReconciler,
};
