//! Batch sync scenarios

mod support;

use stagesync_domain::{BookingStatus, StageSyncError, SyncAction, SyncOperation};
use support::{BookingBuilder, CalendarCall, Harness};
use uuid::Uuid;

#[tokio::test]
async fn intelligent_sync_runs_each_phase_once() {
    let h = Harness::new();
    let band = h.connect("band");
    band.seed(support::calendar_event("band-evt-50"));
    band.seed(support::calendar_event("band-evt-60"));

    // create
    h.repository.insert(BookingBuilder::new(1).starts_in_days(10).build());
    // update: modified after the last sync
    h.repository.insert(
        BookingBuilder::new(2).starts_in_days(12).synced("band-evt-50", 5).modified_days_ago(1).build(),
    );
    // unchanged since last sync
    h.repository.insert(
        BookingBuilder::new(3).starts_in_days(14).synced("band-evt-70", 1).modified_days_ago(3).build(),
    );
    // delete
    h.repository.insert(
        BookingBuilder::new(4)
            .status(BookingStatus::Cancelled)
            .starts_in_days(16)
            .synced("band-evt-60", 2)
            .build(),
    );

    let report = h.orchestrator.intelligent_sync("band").await;

    assert!(report.success, "{}", report.message);
    let actions: Vec<_> = report.actions.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            SyncAction::Create(Uuid::from_u128(1)),
            SyncAction::Update(Uuid::from_u128(2)),
            SyncAction::Delete(Uuid::from_u128(4)),
        ]
    );
    assert!(report.actions.iter().all(|entry| entry.result.success));
    assert!(!band.calls().contains(&CalendarCall::Update("band-evt-70".into())));
    assert_eq!(report.message, "1 created, 1 updated, 1 deleted, 0 failed");
}

#[tokio::test]
async fn cancelled_booking_is_removed_from_the_calendar() {
    let h = Harness::new();
    let band = h.connect("band");
    h.repository.insert(BookingBuilder::new(1).build());
    h.reconciler.reconcile(Uuid::from_u128(1)).await.unwrap();

    let mut cancelled = h.repository.get(Uuid::from_u128(1));
    cancelled.status = BookingStatus::Cancelled;
    h.repository.insert(cancelled);

    let report = h.orchestrator.intelligent_sync("band").await;

    assert_eq!(report.count(SyncOperation::Delete, true), 1);
    assert!(band.calls().contains(&CalendarCall::Delete("band-evt-1".into())));
    let stored = h.repository.get(Uuid::from_u128(1));
    assert!(!stored.sync.synced);
    assert_eq!(stored.sync.external_event_id, None);
}

#[tokio::test]
async fn per_booking_failures_do_not_abort_the_batch() {
    let h = Harness::new();
    let band = h.connect("band");
    band.fail_with(StageSyncError::Provider("rate limited".into()));
    h.repository.insert(BookingBuilder::new(1).starts_in_days(3).build());
    h.repository.insert(BookingBuilder::new(2).starts_in_days(4).build());

    let report = h.orchestrator.intelligent_sync("band").await;

    assert!(report.success);
    assert_eq!(report.error, None);
    assert_eq!(report.actions.len(), 2);
    assert_eq!(report.count(SyncOperation::Create, false), 2);
    assert!(report.message.ends_with("2 failed"), "{}", report.message);
}

#[tokio::test]
async fn nothing_to_do_is_reported_as_up_to_date() {
    let h = Harness::new();
    h.connect("band");
    h.repository.insert(BookingBuilder::new(1).synced("band-evt-1", 1).modified_days_ago(2).build());

    let report = h.orchestrator.intelligent_sync("band").await;

    assert!(report.success);
    assert!(report.actions.is_empty());
    assert_eq!(report.message, "calendar already up to date");
}

#[tokio::test]
async fn store_failure_yields_a_single_fatal_report() {
    let h = Harness::new();
    h.connect("band");
    h.repository.insert(BookingBuilder::new(1).build());
    h.repository.fail_reads();

    let report = h.orchestrator.intelligent_sync("band").await;
    assert!(!report.success);
    assert!(report.actions.is_empty());
    assert!(report.error.unwrap().contains("connection refused"));

    let full = h.orchestrator.sync_all_user_bookings("band").await;
    assert!(!full.success);
    assert!(full.results.is_empty());
}

#[tokio::test]
async fn full_sync_reconciles_every_upcoming_booking() {
    let h = Harness::new();
    let band = h.connect("band");
    h.repository.insert(BookingBuilder::new(1).starts_in_days(2).build());
    h.repository.insert(
        BookingBuilder::new(2).starts_in_days(3).synced("band-evt-40", 1).modified_days_ago(5).build(),
    );
    h.repository.insert(BookingBuilder::new(3).starts_in_days(-3).build());
    h.repository.insert(BookingBuilder::new(4).status(BookingStatus::Pending).starts_in_days(5).build());

    let report = h.orchestrator.sync_all_user_bookings("band").await;

    assert!(report.success);
    let ids: Vec<_> = report.results.iter().map(|result| result.booking_id).collect();
    assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
    // Booking 2's event does not exist remotely, so its update fails.
    assert_eq!(report.synchronized, 1);
    assert_eq!(report.failed, 1);
    assert!(band.calls().contains(&CalendarCall::Update("band-evt-40".into())));
}
