use breaker_core::contract::{
    matches_failure_route, BreakerSettings, FailureNotification, FailureRecord,
};
use breaker_core::window::expiration_for;
use tracing::{error, info, warn};

use crate::adapters::failure_store::FailureStore;
use crate::adapters::request_id::RequestIdSource;
use crate::error::RecorderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(FailureRecord),
    Ignored { reason: String },
}

/// Persists one failure record expiring `window_seconds` after `now`.
///
/// Every call writes a new record with a fresh id, so redelivered
/// notifications are counted again. That only ever opens the circuit sooner.
pub fn record(
    resource: &str,
    error_type: &str,
    now: i64,
    settings: &BreakerSettings,
    store: &dyn FailureStore,
    ids: &dyn RequestIdSource,
) -> Result<FailureRecord, RecorderError> {
    let failure_record = FailureRecord {
        request_id: ids.next_id(),
        site_url: resource.to_string(),
        error_type: error_type.to_string(),
        expiration_time: expiration_for(now, settings.window_seconds()),
    };

    if let Err(store_error) = store.insert(&failure_record) {
        error!(
            event = "failure_record_write_failed",
            resource,
            request_id = %failure_record.request_id,
            error = %store_error,
        );
        return Err(store_error.into());
    }

    info!(
        event = "failure_recorded",
        resource,
        request_id = %failure_record.request_id,
        error_type,
        expiration_time = failure_record.expiration_time,
    );
    Ok(failure_record)
}

/// Handles one bus delivery. `now` is the recorder's own write time.
pub fn handle_failure_event(
    source: &str,
    detail_type: &str,
    detail: &FailureNotification,
    now: i64,
    settings: &BreakerSettings,
    store: &dyn FailureStore,
    ids: &dyn RequestIdSource,
) -> Result<RecordOutcome, RecorderError> {
    if !matches_failure_route(source, detail_type) {
        let reason = format!("unexpected route {source}/{detail_type}");
        warn!(event = "failure_event_ignored", reason = %reason);
        return Ok(RecordOutcome::Ignored { reason });
    }

    if !detail.is_failure() {
        let reason = format!("status '{}' is not a failure", detail.status);
        warn!(event = "failure_event_ignored", reason = %reason);
        return Ok(RecordOutcome::Ignored { reason });
    }

    let resource = detail.site_url.trim();
    if resource.is_empty() {
        return Err(RecorderError::InvalidNotification(
            "siteUrl cannot be empty".to_string(),
        ));
    }

    if let Some(observed_at) = detail.observed_at {
        info!(
            event = "failure_event_received",
            resource,
            delivery_lag_seconds = now.saturating_sub(observed_at),
        );
    }

    record(resource, &detail.error_type, now, settings, store, ids).map(RecordOutcome::Recorded)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use breaker_core::contract::{NOTIFICATION_DETAIL_TYPE, NOTIFICATION_SOURCE};

    use super::*;
    use crate::adapters::failure_store::InMemoryFailureStore;
    use crate::error::StoreError;

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

    struct UnavailableStore;

    impl FailureStore for UnavailableStore {
        fn count_active(&self, _resource: &str, _now: i64) -> Result<u64, StoreError> {
            Ok(0)
        }

        fn insert(&self, _record: &FailureRecord) -> Result<(), StoreError> {
            Err(StoreError::Write("provisioned throughput exceeded".to_string()))
        }
    }

    fn settings() -> BreakerSettings {
        BreakerSettings::new(3, 60).expect("valid settings")
    }

    #[test]
    fn record_sets_expiration_from_window() {
        let store = InMemoryFailureStore::new();
        let written = record(
            "www.example.com",
            "service timeout exception",
            1_000,
            &settings(),
            &store,
            &SequentialIds::new(),
        )
        .expect("record should persist");

        assert_eq!(written.expiration_time, 1_060);
        assert_eq!(written.request_id, "req-0");
        assert_eq!(store.records(), vec![written]);
    }

    #[test]
    fn identical_inputs_produce_distinct_records() {
        let store = InMemoryFailureStore::new();
        let ids = SequentialIds::new();
        let first = record("a", "timeout", 10, &settings(), &store, &ids).expect("first");
        let second = record("a", "timeout", 10, &settings(), &store, &ids).expect("second");

        assert_ne!(first.request_id, second.request_id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn write_failure_is_reported() {
        let error = record(
            "a",
            "timeout",
            10,
            &settings(),
            &UnavailableStore,
            &SequentialIds::new(),
        )
        .expect_err("write failure should surface");

        assert!(matches!(error, RecorderError::StoreUnavailable(_)));
    }

    #[test]
    fn event_uses_recorder_clock_for_expiry() {
        let store = InMemoryFailureStore::new();
        let detail = FailureNotification::failure("www.example.com", "timeout", 990);

        let outcome = handle_failure_event(
            NOTIFICATION_SOURCE,
            NOTIFICATION_DETAIL_TYPE,
            &detail,
            1_000,
            &settings(),
            &store,
            &SequentialIds::new(),
        )
        .expect("event should record");

        match outcome {
            RecordOutcome::Recorded(written) => assert_eq!(written.expiration_time, 1_060),
            other => panic!("expected recorded outcome, got {other:?}"),
        }
    }

    #[test]
    fn foreign_route_is_ignored() {
        let store = InMemoryFailureStore::new();
        let detail = FailureNotification::failure("www.example.com", "timeout", 990);

        let outcome = handle_failure_event(
            "aws.s3",
            NOTIFICATION_DETAIL_TYPE,
            &detail,
            1_000,
            &settings(),
            &store,
            &SequentialIds::new(),
        )
        .expect("foreign event should not error");

        assert!(matches!(outcome, RecordOutcome::Ignored { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn non_failure_status_is_ignored() {
        let store = InMemoryFailureStore::new();
        let mut detail = FailureNotification::failure("www.example.com", "", 990);
        detail.status = "success".to_string();

        let outcome = handle_failure_event(
            NOTIFICATION_SOURCE,
            NOTIFICATION_DETAIL_TYPE,
            &detail,
            1_000,
            &settings(),
            &store,
            &SequentialIds::new(),
        )
        .expect("success status should not error");

        assert!(matches!(outcome, RecordOutcome::Ignored { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_site_url_is_rejected() {
        let store = InMemoryFailureStore::new();
        let detail = FailureNotification::failure("  ", "timeout", 990);

        let error = handle_failure_event(
            NOTIFICATION_SOURCE,
            NOTIFICATION_DETAIL_TYPE,
            &detail,
            1_000,
            &settings(),
            &store,
            &SequentialIds::new(),
        )
        .expect_err("empty siteUrl should fail");

        assert!(matches!(error, RecorderError::InvalidNotification(_)));
        assert!(store.is_empty());
    }
}
