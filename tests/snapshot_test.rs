mod utils;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use staking_rewards_sdk::{OracleReport, SnapshotHandle, SnapshotSource, Uint256};
use utils::test_utils::{eth, FailingOracle, FakeOracle};

fn weekly_report() -> OracleReport {
    OracleReport {
        pre_total_pooled_ether: eth(100),
        post_total_pooled_ether: eth(110),
        time_elapsed: 604_800,
    }
}

fn oracle(report: OracleReport, delay: Option<Duration>) -> Option<Arc<dyn SnapshotSource>> {
    Some(Arc::new(FakeOracle { report, delay }))
}

#[tokio::test]
async fn test_snapshot_starts_loading_then_settles() {
    let source = oracle(weekly_report(), Some(Duration::from_millis(20)));
    let mut handle = SnapshotHandle::spawn(source);

    assert!(handle.current().loading);
    assert_eq!(handle.annual_yield(), 0.0);

    let snapshot = handle.settled().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.data, weekly_report());
    assert!((handle.annual_yield() - 5.214).abs() < 1e-3);
}

#[tokio::test]
async fn test_missing_oracle_settles_with_zero_values() {
    let mut handle = SnapshotHandle::spawn(None);

    let snapshot = handle.settled().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.data.pre_total_pooled_ether, Uint256::zero());
    assert_eq!(snapshot.data.time_elapsed, 0);
    assert_eq!(handle.annual_yield(), 0.0);
}

#[tokio::test]
async fn test_failed_fetch_stays_loading() {
    let mut handle = SnapshotHandle::spawn(Some(Arc::new(FailingOracle)));

    let snapshot = handle.settled().await;
    assert!(snapshot.loading, "A failed read is never marked loaded");
    assert_eq!(handle.annual_yield(), 0.0);
}

#[tokio::test]
async fn test_dropping_handle_discards_fetch() {
    let handle = SnapshotHandle::spawn(oracle(weekly_report(), Some(Duration::from_secs(30))));
    let mut receiver = handle.subscribe();

    drop(handle);

    // The task ends without publishing, which closes the channel
    let changed = tokio::time::timeout(Duration::from_secs(5), receiver.changed())
        .await
        .expect("Fetch task was not cancelled");
    assert!(changed.is_err());
    assert!(receiver.borrow().loading);
}

#[tokio::test]
async fn test_independent_snapshots() {
    let reports = [
        weekly_report(),
        OracleReport {
            pre_total_pooled_ether: eth(1000),
            post_total_pooled_ether: eth(1001),
            time_elapsed: 86_400,
        },
    ];

    let mut handles: Vec<SnapshotHandle> = reports
        .iter()
        .map(|report| SnapshotHandle::spawn(oracle(*report, None)))
        .collect();

    let snapshots = join_all(handles.iter_mut().map(|handle| handle.settled())).await;

    assert_eq!(snapshots[0].data, reports[0]);
    assert_eq!(snapshots[1].data, reports[1]);
    assert!((snapshots[1].annual_yield() - 0.365).abs() < 1e-9);
}
