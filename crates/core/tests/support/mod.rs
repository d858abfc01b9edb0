//! Shared test helpers for `stagesync-core` integration tests.
//!
//! In-memory fakes for every port the engine consumes plus a booking
//! builder, so the scenario tests can focus on behaviour.

#![allow(dead_code)]

pub mod calendar;
pub mod fixtures;
pub mod repositories;

use std::sync::Arc;

use stagesync_core::{
    ConflictDetector, HealthMonitor, StatisticsAggregator, SyncOrchestrator, SyncReconciler,
};

pub use calendar::{CalendarCall, FixedClock, MockCalendarClient, MockCalendars, MockCredentials};
pub use fixtures::{calendar_event, external_event, now, BookingBuilder};
pub use repositories::MockBookingRepository;

/// Every service wired to the same fakes.
pub struct Harness {
    pub repository: MockBookingRepository,
    pub credentials: MockCredentials,
    pub calendars: MockCalendars,
    pub clock: Arc<FixedClock>,
    pub reconciler: Arc<SyncReconciler>,
    pub orchestrator: SyncOrchestrator,
    pub conflicts: Arc<ConflictDetector>,
    pub stats: Arc<StatisticsAggregator>,
    pub health: HealthMonitor,
}

impl Harness {
    pub fn new() -> Self {
        let repository = MockBookingRepository::default();
        let credentials = MockCredentials::default();
        let calendars = MockCalendars::default();
        let clock = Arc::new(FixedClock(now()));

        let reconciler = Arc::new(
            SyncReconciler::new(
                Arc::new(repository.clone()),
                Arc::new(credentials.clone()),
                Arc::new(calendars.clone()),
            )
            .with_clock(clock.clone()),
        );
        let orchestrator = SyncOrchestrator::new(Arc::clone(&reconciler));
        let conflicts = Arc::new(
            ConflictDetector::new(
                Arc::new(repository.clone()),
                Arc::new(credentials.clone()),
                Arc::new(calendars.clone()),
            )
            .with_clock(clock.clone()),
        );
        let stats = Arc::new(
            StatisticsAggregator::new(Arc::new(repository.clone())).with_clock(clock.clone()),
        );
        let health = HealthMonitor::new(
            Arc::new(credentials.clone()),
            Arc::new(calendars.clone()),
            Arc::clone(&conflicts),
            Arc::clone(&stats),
        )
        .with_clock(clock.clone());

        Self {
            repository,
            credentials,
            calendars,
            clock,
            reconciler,
            orchestrator,
            conflicts,
            stats,
            health,
        }
    }

    /// Connect `user_id` and return the calendar its token opens.
    pub fn connect(&self, user_id: &str) -> MockCalendarClient {
        let token = self.credentials.connect(user_id);
        self.calendars.calendar_for(&token.access_token)
    }
}
