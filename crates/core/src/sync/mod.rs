//! Booking to calendar synchronization domain

pub mod conflicts;
pub mod health;
pub mod locks;
pub mod orchestrator;
pub mod ports;
pub mod reconciler;
pub mod stats;
pub mod translator;

pub use conflicts::{detect_conflicts, intervals_overlap, ConflictDetector};
pub use health::HealthMonitor;
pub use locks::{BookingGuard, BookingLocks};
pub use orchestrator::{plan_sync_actions, SyncOrchestrator};
pub use ports::*;
pub use reconciler::{SyncReconciler, SyncTarget};
pub use stats::{compute_stats, StatisticsAggregator};
pub use translator::EventTranslator;
