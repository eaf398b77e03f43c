use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use breaker_core::contract::{BreakerSettings, FailureNotification, FailureRecord};
use breaker_core::window::Decision;
use breaker_lambda::adapters::channel::FailureChannel;
use breaker_lambda::adapters::downstream::{Downstream, SimulatedOutage};
use breaker_lambda::adapters::failure_store::{FailureStore, InMemoryFailureStore};
use breaker_lambda::adapters::request_id::RequestIdSource;
use breaker_lambda::config::{GateConfig, StoreFailurePolicy};
use breaker_lambda::error::{ChannelError, DownstreamFailure, GateError, StoreError};
use breaker_lambda::handlers::gate::{
    evaluate, handle_gate_request, GateDependencies, CIRCUIT_OPEN_MESSAGE,
    TRANSIENT_FAILURE_MESSAGE,
};
use breaker_lambda::handlers::recorder::record;

const RESOURCE: &str = "www.example.com";

struct SequentialIds {
    next: AtomicUsize,
}

impl SequentialIds {
    fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
        }
    }
}

impl RequestIdSource for SequentialIds {
    fn next_id(&self) -> String {
        format!("req-{}", self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Delivers each notification straight to the recorder, stamped with the time
/// the gate observed the failure.
struct LoopbackChannel<'a> {
    store: &'a InMemoryFailureStore,
    settings: BreakerSettings,
    ids: SequentialIds,
}

impl FailureChannel for LoopbackChannel<'_> {
    fn publish(&self, notification: &FailureNotification) -> Result<(), ChannelError> {
        let now = notification.observed_at.unwrap_or_default();
        record(
            &notification.site_url,
            &notification.error_type,
            now,
            &self.settings,
            self.store,
            &self.ids,
        )
        .map(|_| ())
        .map_err(|error| ChannelError(error.to_string()))
    }
}

struct HealthyDownstream;

impl Downstream for HealthyDownstream {
    fn call(&self, _resource: &str) -> Result<String, DownstreamFailure> {
        Ok("ok".to_string())
    }
}

struct UnavailableStore;

impl FailureStore for UnavailableStore {
    fn count_active(&self, _resource: &str, _now: i64) -> Result<u64, StoreError> {
        Err(StoreError::Query("table not reachable".to_string()))
    }

    fn insert(&self, _record: &FailureRecord) -> Result<(), StoreError> {
        Err(StoreError::Write("table not reachable".to_string()))
    }
}

fn settings() -> BreakerSettings {
    BreakerSettings::new(3, 60).expect("valid settings")
}

fn gate_config() -> GateConfig {
    GateConfig {
        resource: RESOURCE.to_string(),
        settings: settings(),
        downstream_url: None,
        downstream_timeout: Duration::from_secs(10),
        simulate_outage: true,
        store_failure_policy: StoreFailurePolicy::Surface,
        table_name: "circuitBreaker".to_string(),
        index_name: "UrlIndex".to_string(),
        event_bus_name: "default".to_string(),
    }
}

fn record_failure_at(store: &InMemoryFailureStore, ids: &SequentialIds, now: i64) {
    record(RESOURCE, "service timeout exception", now, &settings(), store, ids)
        .expect("record should persist");
}

#[test]
fn threshold_failures_within_window_open_the_circuit() {
    let store = InMemoryFailureStore::new();
    let ids = SequentialIds::new();

    for now in [100, 101] {
        record_failure_at(&store, &ids, now);
        assert_eq!(
            evaluate(RESOURCE, now, &settings(), &store).expect("evaluate"),
            Decision::Closed
        );
    }

    record_failure_at(&store, &ids, 102);
    assert_eq!(
        evaluate(RESOURCE, 102, &settings(), &store).expect("evaluate"),
        Decision::Open
    );
}

#[test]
fn window_boundary_is_exclusive_at_expiration() {
    let store = InMemoryFailureStore::new();
    let ids = SequentialIds::new();
    for _ in 0..3 {
        record_failure_at(&store, &ids, 0);
    }

    // Every record expires at t=60.
    assert_eq!(
        evaluate(RESOURCE, 59, &settings(), &store).expect("evaluate"),
        Decision::Open
    );
    assert_eq!(
        evaluate(RESOURCE, 60, &settings(), &store).expect("evaluate"),
        Decision::Closed
    );
}

#[test]
fn documented_timeline_opens_then_recovers() {
    let store = InMemoryFailureStore::new();
    let ids = SequentialIds::new();

    record_failure_at(&store, &ids, 0);
    record_failure_at(&store, &ids, 10);
    assert_eq!(
        evaluate(RESOURCE, 20, &settings(), &store).expect("evaluate"),
        Decision::Closed
    );

    record_failure_at(&store, &ids, 15);
    assert_eq!(
        evaluate(RESOURCE, 20, &settings(), &store).expect("evaluate"),
        Decision::Open
    );

    // Expirations are 60, 70 and 75; at t=61 only the first has lapsed, so the
    // count drops below the threshold.
    assert_eq!(
        evaluate(RESOURCE, 61, &settings(), &store).expect("evaluate"),
        Decision::Closed
    );
    assert_eq!(
        evaluate(RESOURCE, 76, &settings(), &store).expect("evaluate"),
        Decision::Closed
    );
    assert_eq!(store.count_active(RESOURCE, 76).expect("count"), 0);
    assert_eq!(store.len(), 3);
}

#[test]
fn duplicate_recording_only_tightens_the_circuit() {
    let single = InMemoryFailureStore::new();
    let duplicated = InMemoryFailureStore::new();
    let ids = SequentialIds::new();

    record_failure_at(&single, &ids, 0);
    record_failure_at(&single, &ids, 5);

    record_failure_at(&duplicated, &ids, 0);
    record_failure_at(&duplicated, &ids, 0);
    record_failure_at(&duplicated, &ids, 5);

    let request_ids: Vec<String> = duplicated
        .records()
        .into_iter()
        .map(|written| written.request_id)
        .collect();
    assert_eq!(request_ids.len(), 3);
    assert_ne!(request_ids[0], request_ids[1]);

    assert_eq!(
        evaluate(RESOURCE, 10, &settings(), &single).expect("evaluate"),
        Decision::Closed
    );
    assert_eq!(
        evaluate(RESOURCE, 10, &settings(), &duplicated).expect("evaluate"),
        Decision::Open
    );
}

#[test]
fn successful_calls_never_write_records() {
    let store = InMemoryFailureStore::new();
    let channel = LoopbackChannel {
        store: &store,
        settings: settings(),
        ids: SequentialIds::new(),
    };
    let deps = GateDependencies {
        store: &store,
        channel: &channel,
        downstream: &HealthyDownstream,
    };

    for now in 0..25 {
        let response = handle_gate_request(&gate_config(), now, &deps);
        assert_eq!(response.status_code, 200);
    }

    assert!(store.is_empty());
}

#[test]
fn outage_trips_the_gate_and_it_closes_after_the_window() {
    let store = InMemoryFailureStore::new();
    let channel = LoopbackChannel {
        store: &store,
        settings: settings(),
        ids: SequentialIds::new(),
    };
    let outage = SimulatedOutage::default();
    let deps = GateDependencies {
        store: &store,
        channel: &channel,
        downstream: &outage,
    };
    let config = gate_config();

    for now in [0, 1, 2] {
        let response = handle_gate_request(&config, now, &deps);
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, TRANSIENT_FAILURE_MESSAGE);
    }
    assert_eq!(store.len(), 3);

    let response = handle_gate_request(&config, 3, &deps);
    assert_eq!(response.body, CIRCUIT_OPEN_MESSAGE);
    assert_eq!(store.len(), 3);

    let response = handle_gate_request(&config, 62, &deps);
    assert_eq!(response.body, TRANSIENT_FAILURE_MESSAGE);
    assert_eq!(store.len(), 4);
}

#[test]
fn unavailable_store_is_not_a_decision() {
    let result = evaluate(RESOURCE, 0, &settings(), &UnavailableStore);
    assert!(matches!(result, Err(GateError::StoreUnavailable(_))));
}
