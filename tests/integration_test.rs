//! Integration tests for the record-replay cycle

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use stubtape::config::Config;
use stubtape::fixture::TestCase;
use stubtape::harness::Harness;
use stubtape::hosts::HostIndex;
use stubtape::network::{ObservedRequest, Route};
use stubtape::storage::SnapshotStore;

const FIXTURE: &str = "users.api.snapshot.json";

/// Create test configuration
fn create_test_config(record: bool, hosts: &str, fixtures_dir: &std::path::Path) -> Config {
    let mut config = Config {
        auto_record_enabled: record,
        api_hosts: hosts.to_string(),
        stub_api_patterns: "/users, /orders".to_string(),
        fixtures_dir: fixtures_dir.to_path_buf(),
        ..Config::default()
    };
    config.debounce.record_ms = 20;
    config.idle.poll_interval_ms = 5;
    config.idle.timeout_ms = 2_000;
    config
}

fn test_case(title: &str) -> TestCase {
    TestCase::new("integration/users.spec.ts", title).unwrap()
}

/// Drive one recorded exchange the way the network shim would
async fn live_call(
    session: &stubtape::harness::TestSession,
    method: &str,
    url: &str,
    response: serde_json::Value,
) {
    let ticket = session.request_observed(ObservedRequest::new(method, url));
    assert_eq!(ticket.route, Route::Intercept, "{method} {url} should be intercepted");
    session.response_observed(ticket.id, response).await.unwrap();
}

#[tokio::test]
async fn test_record_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let harness = Harness::new(create_test_config(
        true,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();

    let session = harness.setup(test_case("Users loads user")).await.unwrap();
    live_call(&session, "GET", "https://api.example.com/users/1", json!({"id": 1})).await;
    session.wait_until_idle().await.unwrap();
    harness.teardown(session).await.unwrap();

    let content = std::fs::read_to_string(temp_dir.path().join(FIXTURE)).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
    let record = &raw["Users loads user"]["records"][0];

    assert_eq!(record["url"], "/users/1");
    assert_eq!(record["method"], "GET");
    assert_eq!(record["matchHostIndex"], 0);
    assert_eq!(record["response"]["body"], json!({"id": 1}));
}

#[tokio::test]
async fn test_replay_scenario() {
    let temp_dir = TempDir::new().unwrap();

    // Phase 1: Record
    {
        let harness = Harness::new(create_test_config(
            true,
            "https://api.example.com",
            temp_dir.path(),
        ))
        .unwrap();
        let session = harness.setup(test_case("Users loads user")).await.unwrap();
        live_call(&session, "GET", "https://api.example.com/users/1", json!({"id": 1})).await;
        harness.teardown(session).await.unwrap();
    }

    // Phase 2: Replay
    {
        let harness = Harness::new(create_test_config(
            false,
            "https://api.example.com",
            temp_dir.path(),
        ))
        .unwrap();
        let session = harness.setup(test_case("Users loads user")).await.unwrap();
        assert_eq!(session.stubs_installed().await, 1);

        let ticket =
            session.request_observed(ObservedRequest::new("GET", "https://api.example.com/users/1"));
        assert_eq!(ticket.route, Route::Stub(json!({"id": 1})));
        session.response_observed(ticket.id, json!({"id": 1})).await.unwrap();

        // Replay debounce is zero: idle right away.
        assert_eq!(session.in_flight(), 0);
        assert!(session.recorded().await.is_empty());
        harness.teardown(session).await.unwrap();
    }
}

#[tokio::test]
async fn test_replay_against_different_environment() {
    let temp_dir = TempDir::new().unwrap();
    let hosts_recorded = "https://api.example.com, https://orders.example.com";
    let hosts_ci = "http://localhost:8001, http://localhost:8002";

    {
        let harness = Harness::new(create_test_config(true, hosts_recorded, temp_dir.path())).unwrap();
        let session = harness.setup(test_case("Orders list")).await.unwrap();
        live_call(&session, "GET", "https://orders.example.com/orders?page=2", json!([{"id": 9}])).await;
        live_call(&session, "POST", "https://api.example.com/users", json!({"created": true})).await;
        harness.teardown(session).await.unwrap();
    }

    let harness = Harness::new(create_test_config(false, hosts_ci, temp_dir.path())).unwrap();
    let session = harness.setup(test_case("Orders list")).await.unwrap();

    assert_eq!(
        session.route("GET", "http://localhost:8002/orders?page=2"),
        Route::Stub(json!([{"id": 9}]))
    );
    assert_eq!(
        session.route("POST", "http://localhost:8001/users"),
        Route::Stub(json!({"created": true}))
    );
    assert_eq!(
        session.route("GET", "https://orders.example.com/orders?page=2"),
        Route::PassThrough
    );
}

#[tokio::test]
async fn test_unmatched_host_sentinel() {
    let temp_dir = TempDir::new().unwrap();
    let harness = Harness::new(create_test_config(
        true,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();

    let session = harness.setup(test_case("Users third party")).await.unwrap();
    live_call(&session, "GET", "https://partner.net/users/lookup", json!({"ok": true})).await;
    harness.teardown(session).await.unwrap();

    let snapshot = SnapshotStore::new(temp_dir.path())
        .load_test_case(FIXTURE, "Users third party")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.records[0].url, "https://partner.net/users/lookup");
    assert_eq!(snapshot.records[0].match_host_index, HostIndex::Unmatched);

    // Replays at the same absolute URL.
    let harness = Harness::new(create_test_config(
        false,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();
    let session = harness.setup(test_case("Users third party")).await.unwrap();
    assert_eq!(
        session.route("GET", "https://partner.net/users/lookup"),
        Route::Stub(json!({"ok": true}))
    );
}

#[tokio::test]
async fn test_merge_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(temp_dir.path());
    let harness = Harness::new(create_test_config(
        true,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();

    let session = harness.setup(test_case("Suite A > test 1")).await.unwrap();
    live_call(&session, "GET", "https://api.example.com/users/1", json!({"id": 1})).await;
    harness.teardown(session).await.unwrap();
    let first = store.load_test_case(FIXTURE, "Suite A > test 1").await.unwrap();

    let session = harness.setup(test_case("Suite A > test 2")).await.unwrap();
    live_call(&session, "GET", "https://api.example.com/users/2", json!({"id": 2})).await;
    harness.teardown(session).await.unwrap();

    // Re-recording test 2 replaces only test 2.
    let session = harness.setup(test_case("Suite A > test 2")).await.unwrap();
    live_call(&session, "GET", "https://api.example.com/users/3", json!({"id": 3})).await;
    harness.teardown(session).await.unwrap();

    let file = store.read(FIXTURE).await.unwrap().unwrap();
    let titles: Vec<_> = file.iter().map(|(title, _)| title).collect();
    assert_eq!(titles, vec!["Suite A > test 1", "Suite A > test 2"]);
    assert_eq!(file.get("Suite A > test 1").cloned(), first);

    let second = file.get("Suite A > test 2").unwrap();
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].url, "/users/3");
}

#[tokio::test]
async fn test_corrupt_fixture_fails_replay_setup() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(FIXTURE), "[1, 2").unwrap();

    let harness = Harness::new(create_test_config(
        false,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();

    assert!(harness.setup(test_case("Users loads user")).await.is_err());
}

#[tokio::test]
async fn test_concurrent_exchanges_and_counter_pairing() {
    let temp_dir = TempDir::new().unwrap();
    let harness = Harness::new(create_test_config(
        true,
        "https://api.example.com",
        temp_dir.path(),
    ))
    .unwrap();

    let session = Arc::new(harness.setup(test_case("Users burst")).await.unwrap());
    assert_eq!(session.in_flight(), 0);

    let tickets: Vec<_> = (0..8)
        .map(|i| {
            session.request_observed(ObservedRequest::new(
                "GET",
                format!("https://api.example.com/users/{i}"),
            ))
        })
        .collect();
    assert_eq!(session.in_flight(), 8);

    let mut tasks = tokio::task::JoinSet::new();
    for (i, ticket) in tickets.into_iter().enumerate().rev() {
        let session = Arc::clone(&session);
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(i as u64)).await;
            session
                .response_observed(ticket.id, json!({"id": i}))
                .await
                .unwrap();
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    session.wait_until_idle().await.unwrap();
    assert_eq!(session.recorded().await.len(), 8);

    let session = Arc::try_unwrap(session).ok().unwrap();
    harness.teardown(session).await.unwrap();

    let snapshot = SnapshotStore::new(temp_dir.path())
        .load_test_case(FIXTURE, "Users burst")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.records.len(), 8);
}

#[tokio::test]
async fn test_persistence_failure_surfaces_at_teardown() {
    let temp_dir = TempDir::new().unwrap();
    // A regular file where the fixtures directory should be.
    let blocker = temp_dir.path().join("fixtures");
    std::fs::write(&blocker, "").unwrap();

    let harness = Harness::new(create_test_config(true, "https://api.example.com", &blocker)).unwrap();
    let session = harness.setup(test_case("Users loads user")).await.unwrap();
    live_call(&session, "GET", "https://api.example.com/users/1", json!({"id": 1})).await;

    assert!(harness.teardown(session).await.is_err());
}
