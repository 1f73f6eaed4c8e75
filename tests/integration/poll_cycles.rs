//! Poll cycle semantics: gating, dispatch, change detection, notifications

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use sitewatch::scheduler::SchedulerHandle;
use sitewatch::storage::Store;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn sync_disabled_target_is_never_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/enabled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/disabled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut disabled = create_test_target("b", &format!("{}/disabled", mock_server.uri()));
    disabled.sync_enabled = false;

    let rig = create_test_rig(
        vec![
            create_test_target("a", &format!("{}/enabled", mock_server.uri())),
            disabled,
        ],
        None,
    )
    .await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);
    let stats = handle.cycle_now().await.unwrap();

    assert_eq!(stats.dispatched, 1);
    assert!(rig.store.latest_snapshot("a").await.unwrap().is_some());
    assert!(rig.store.latest_snapshot("b").await.unwrap().is_none());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn unsatisfied_gate_runs_zero_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("content"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let rig = create_test_rig(
        vec![create_test_target("a", &mock_server.uri())],
        Some(Box::new(FixedGate(false))),
    )
    .await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);
    let stats = handle.cycle_now().await.unwrap();

    assert!(!stats.gate_satisfied);
    assert_eq!(stats.dispatched, 0);
    assert_eq!(rig.store.snapshot_count().await, 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn scenario_same_length_then_grown_content() {
    let mock_server = MockServer::start().await;

    // Cycle 1: 100 bytes (baseline). Cycle 2: 100 different bytes.
    // Cycle 3: 250 bytes.
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(move |_req: &wiremock::Request| {
            let body = match hits_clone.fetch_add(1, Ordering::SeqCst) {
                0 => vec![b'a'; 100],
                1 => vec![b'b'; 100],
                _ => vec![b'c'; 250],
            };
            ResponseTemplate::new(200).set_body_bytes(body)
        })
        .mount(&mock_server)
        .await;

    let rig = create_test_rig(
        vec![create_test_target("page", &format!("{}/page", mock_server.uri()))],
        None,
    )
    .await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);

    // Baseline fetch: snapshot recorded, nothing to compare against
    handle.cycle_now().await.unwrap();
    assert_eq!(rig.notifier.count().await, 0);

    // Same length, different bytes: no notification
    handle.cycle_now().await.unwrap();
    assert_eq!(rig.notifier.count().await, 0);

    let target = &rig.store.list_targets().await.unwrap()[0];
    assert!(target.last_success);

    // Grown content: notification with the target's title and URL
    handle.cycle_now().await.unwrap();

    let delivered = rig.notifier.delivered.lock().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "Change detected on Test page!");
    assert_eq!(delivered[0].1, format!("{}/page", mock_server.uri()));
    drop(delivered);

    assert_eq!(rig.store.snapshot_history("page", 10).await.unwrap().len(), 3);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn notification_flag_gates_delivery() {
    let mock_server = MockServer::start().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    // Every fetch grows by a byte, so every non-baseline cycle is a change
    Mock::given(method("GET"))
        .respond_with(move |_req: &wiremock::Request| {
            let n = hits_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 10 + n])
        })
        .mount(&mock_server)
        .await;

    let mut muted = create_test_target("muted", &format!("{}/muted", mock_server.uri()));
    muted.notify_enabled = false;

    let rig = create_test_rig(
        vec![
            create_test_target("loud", &format!("{}/loud", mock_server.uri())),
            muted,
        ],
        None,
    )
    .await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);

    handle.cycle_now().await.unwrap();
    handle.cycle_now().await.unwrap();

    // Both targets changed, only the opted-in one notified
    let delivered = rig.notifier.delivered.lock().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "Change detected on Test loud!");
    drop(delivered);

    assert!(rig.store.latest_snapshot("muted").await.unwrap().is_some());

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn blank_response_marks_failure_but_still_snapshots() {
    let mock_server = MockServer::start().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();

    Mock::given(method("GET"))
        .respond_with(move |_req: &wiremock::Request| {
            if hits_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(200).set_body_string("real content")
            } else {
                ResponseTemplate::new(200) // empty body
            }
        })
        .mount(&mock_server)
        .await;

    let rig = create_test_rig(vec![create_test_target("a", &mock_server.uri())], None).await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);

    handle.cycle_now().await.unwrap();
    handle.cycle_now().await.unwrap();

    let target = &rig.store.list_targets().await.unwrap()[0];
    assert!(!target.last_success);
    assert!(target.last_checked.is_some());

    // Both fetches completed, so both produced snapshots
    assert_eq!(rig.store.snapshot_history("a", 10).await.unwrap().len(), 2);

    // Length changed (12 -> 0), but a failed fetch never notifies
    assert_eq!(rig.notifier.count().await, 0);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn update_interval_takes_effect_without_error() {
    let rig = create_test_rig(vec![], None).await;

    let handle = SchedulerHandle::spawn(rig.deps, 3600);

    handle.update_interval(1).await.unwrap();
    let stats = handle.cycle_now().await.unwrap();
    assert_eq!(stats.dispatched, 0);

    handle.shutdown().await.unwrap();
}
