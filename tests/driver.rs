//! End-to-end scenarios driving a whole `Driver` against the in-memory
//! `MockBackend` fake, covering the pool's admission control, lazy-BEGIN
//! transaction handling, failure budget, and shutdown behavior together —
//! properties that span more than one module and can't be exercised by a
//! single file's unit tests.

use std::sync::Arc;
use std::time::Duration;

use qdrive::testing::MockBackend;
use qdrive::{Config, Driver, DriverStatus, Error};

/// `env_logger::init()` panics if called twice; every test below runs in its
/// own process-wide logger, so use `try_init()` the way `log`-backed tests
/// across this lineage do when more than one `#[test]` fn shares a binary.
fn init_logger() {
    let _ = env_logger::try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_concurrent_queries_share_two_connections() {
    init_logger();
    let backend = MockBackend::new();
    let driver = Arc::new(
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(2)).unwrap(),
    );
    driver.start().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let driver = Arc::clone(&driver);
        handles.push(tokio::spawn(async move { driver.query("SELECT 1").await }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(backend.connect_attempts(), 2);
    assert_eq!(backend.queries().len(), 5);
}

#[tokio::test]
async fn begin_then_commit_with_no_queries_emits_no_sql() {
    init_logger();
    let backend = MockBackend::new();
    let driver =
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap();
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();
    let result = tx.commit().await.unwrap();

    assert!(result.is_none());
    assert!(backend.queries().is_empty());
}

#[tokio::test]
async fn begin_then_rollback_with_no_queries_emits_no_sql() {
    init_logger();
    let backend = MockBackend::new();
    let driver =
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap();
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();
    let result = tx.rollback().await.unwrap();

    assert!(result.is_none());
    assert!(backend.queries().is_empty());
}

#[tokio::test]
async fn begin_query_commit_emits_begin_prefixed_then_commit() {
    init_logger();
    let backend = MockBackend::new();
    let driver =
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap();
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();
    tx.query("UPDATE t SET x=1").await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(
        backend.queries(),
        vec!["BEGIN;\nUPDATE t SET x=1".to_owned(), "COMMIT;".to_owned()]
    );
}

#[tokio::test]
async fn begin_query_rollback_emits_begin_prefixed_then_rollback() {
    init_logger();
    let backend = MockBackend::new();
    let driver =
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap();
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();
    tx.query("UPDATE t SET x=1").await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(
        backend.queries(),
        vec!["BEGIN;\nUPDATE t SET x=1".to_owned(), "ROLLBACK;".to_owned()]
    );
}

#[tokio::test]
async fn commit_with_trailing_statement_right_after_begin_folds_into_one_call() {
    init_logger();
    let backend = MockBackend::new();
    let driver =
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap();
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();
    tx.commit_with("INSERT INTO t VALUES(1)").await.unwrap();

    assert_eq!(
        backend.queries(),
        vec!["BEGIN;\nINSERT INTO t VALUES(1)\nCOMMIT;".to_owned()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn connect_failures_below_budget_are_retried_silently() {
    init_logger();
    let backend = MockBackend::new();
    backend.fail_next_connects(2);
    let driver = Driver::new(
        Config::new("pgsql")
            .backend(backend.clone())
            .max_connections(1)
            .maximum_failures(5),
    )
    .unwrap();
    driver.start().await.unwrap();

    let result = driver.query("SELECT 1").await;

    assert!(result.is_ok());
    assert_eq!(backend.connect_attempts(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn connect_failures_at_or_past_budget_stop_the_driver() {
    init_logger();
    let backend = MockBackend::new();
    backend.fail_next_connects(3);
    let driver = Driver::new(
        Config::new("pgsql")
            .backend(backend.clone())
            .max_connections(1)
            .maximum_failures(3),
    )
    .unwrap();
    driver.start().await.unwrap();

    let result = driver.query("SELECT 1").await;

    assert!(matches!(result, Err(Error::Backend(_))));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(driver.status(), DriverStatus::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_during_a_transaction_rejects_new_work_but_finishes_in_flight_work() {
    init_logger();
    let backend = MockBackend::new();
    let driver = Arc::new(
        Driver::new(Config::new("pgsql").backend(backend.clone()).max_connections(1)).unwrap(),
    );
    driver.start().await.unwrap();

    let mut tx = driver.begin().await.unwrap();

    let stop_handle = tokio::spawn({
        let driver = Arc::clone(&driver);
        async move { driver.stop().await }
    });
    // Give the actor a chance to process `Stop` (and flip to `Stopping`)
    // ahead of the `query` below, without making the two racy.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let rejected = driver.query("SELECT 1").await;
    assert!(matches!(rejected, Err(Error::DriverState(_))));

    tx.query("UPDATE t SET x=1").await.unwrap();
    tx.commit().await.unwrap();

    stop_handle.await.unwrap().unwrap();
    assert_eq!(driver.status(), DriverStatus::Stopped);
}
