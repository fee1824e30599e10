//! Bulk sync over a paged billing customer list.

mod helpers;

use std::sync::Arc;

use deskbridge_directory::DirectoryUser;
use deskbridge_reconcile::{
    BulkSync, BulkSyncError, BulkSyncOptions, EngineOptions, ReconciliationEngine,
};
use tokio_util::sync::CancellationToken;

use helpers::fake_billing::{customer, FakeBilling};
use helpers::fake_directory::{FakeDirectory, Op};

fn bulk_sync(
    directory: &Arc<FakeDirectory>,
    billing: Arc<FakeBilling>,
    options: BulkSyncOptions,
) -> BulkSync {
    let engine = Arc::new(ReconciliationEngine::new(
        directory.clone(),
        EngineOptions::default(),
    ));
    BulkSync::new(engine, billing, options)
}

fn customers() -> Vec<deskbridge_billing::CustomerRecord> {
    vec![
        customer("C1", "one@example.com", "ann", "one", "0400 000 001"),
        customer("C2", "two@example.com", "bob", "two", ""),
        customer("C3", "staff@internal.test", "cat", "three", ""),
        customer("C4", "four@example.com", "", "", ""),
        customer("C5", "five@example.com", "eve", "five", "0400 000 005"),
    ]
}

#[tokio::test]
async fn test_bulk_sync_walks_every_page() {
    let directory = Arc::new(FakeDirectory::new());
    let billing = Arc::new(FakeBilling::new(customers(), 2));
    let options = BulkSyncOptions {
        parallelism: 2,
        exclude_email_suffixes: vec!["@INTERNAL.test".to_string()],
        ..Default::default()
    };

    let report = bulk_sync(&directory, billing.clone(), options)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(
        billing.requested_tokens(),
        vec![None, Some("1".to_string()), Some("2".to_string())]
    );
    assert_eq!(report.excluded, 1);
    assert_eq!(report.created, 3);
    assert_eq!(report.no_action, 1);
    assert!(report.failures.is_empty());
    assert_eq!(report.processed(), 4);
    assert!(!report.cancelled);

    let mut external_ids: Vec<_> = directory
        .users()
        .into_iter()
        .filter_map(|u| u.external_id)
        .collect();
    external_ids.sort();
    assert_eq!(external_ids, vec!["C1", "C2", "C5"]);
}

#[tokio::test]
async fn test_bulk_sync_records_failures_and_continues() {
    let duplicate = |id| DirectoryUser {
        id: Some(id),
        email: "two@example.com".to_string(),
        name: "Bob Two".to_string(),
        active: true,
        verified: true,
        ..Default::default()
    };
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user(duplicate(1))
            .with_user(duplicate(2)),
    );
    let billing = Arc::new(FakeBilling::new(customers(), 10));

    let report = bulk_sync(&directory, billing, BulkSyncOptions::default())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.external_id, "C2");
    assert_eq!(failure.error_code, "AMBIGUOUS_DIRECTORY_STATE");
    assert!(!failure.retryable);
    assert_eq!(report.created, 3);
}

#[tokio::test]
async fn test_bulk_sync_email_filter() {
    let directory = Arc::new(FakeDirectory::new());
    let billing = Arc::new(FakeBilling::new(customers(), 10));
    let options = BulkSyncOptions {
        email: Some("five@example.com".to_string()),
        ..Default::default()
    };

    let report = bulk_sync(&directory, billing, options)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.processed(), 1);
    assert_eq!(directory.users()[0].external_id.as_deref(), Some("C5"));
}

#[tokio::test]
async fn test_bulk_sync_listing_failure_aborts() {
    let directory = Arc::new(FakeDirectory::new());
    let billing = Arc::new(FakeBilling::new(customers(), 2).failing_on_page(1));

    let err = bulk_sync(&directory, billing, BulkSyncOptions::default())
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BulkSyncError::Billing(_)));
    // The first page was still reconciled before the abort.
    assert_eq!(directory.users().len(), 2);
}

#[tokio::test]
async fn test_bulk_sync_cancelled_before_start() {
    let directory = Arc::new(FakeDirectory::new());
    let billing = Arc::new(FakeBilling::new(customers(), 2));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = bulk_sync(&directory, billing.clone(), BulkSyncOptions::default())
        .run(&cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.pages, 0);
    assert!(billing.requested_tokens().is_empty());
    assert!(directory.calls().is_empty());
}

#[tokio::test]
async fn test_bulk_sync_transport_failures_are_retryable() {
    let directory = Arc::new(FakeDirectory::new().failing(Op::Write));
    let billing = Arc::new(FakeBilling::new(customers(), 10));

    let report = bulk_sync(&directory, billing, BulkSyncOptions::default())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 4);
    assert!(report.failures.iter().all(|f| f.retryable));
    assert_eq!(report.no_action, 1);
}

#[tokio::test]
async fn test_panicked_run_keeps_customer_id() {
    let directory = Arc::new(FakeDirectory::new().panicking_for("C2"));
    let billing = Arc::new(FakeBilling::new(
        vec![
            customer("C1", "one@example.com", "ann", "one", ""),
            customer("C2", "two@example.com", "bob", "two", ""),
        ],
        10,
    ));

    let report = bulk_sync(&directory, billing, BulkSyncOptions::default())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].external_id, "C2");
    assert_eq!(report.failures[0].error_code, "INTERNAL");
}
