//! Rolling failure window and the admission decision derived from it.
//!
//! There is no stored open/closed flag. The circuit state is recomputed on
//! every read from the set of unexpired failure records, so it closes again on
//! its own once those records age out of the window.

use crate::contract::{BreakerSettings, FailureRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Fewer than `error_threshold` active failures; the call may be attempted.
    Closed,
    /// Threshold reached; the call must not be attempted.
    Open,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
        }
    }

    pub fn permits_call(self) -> bool {
        matches!(self, Self::Closed)
    }
}

pub fn expiration_for(now: i64, window_seconds: i64) -> i64 {
    now.saturating_add(window_seconds)
}

/// A record counts iff it targets `resource` and expires strictly after `now`.
pub fn counts_toward(record: &FailureRecord, resource: &str, now: i64) -> bool {
    record.site_url == resource && record.expiration_time > now
}

pub fn count_active<'a>(
    records: impl IntoIterator<Item = &'a FailureRecord>,
    resource: &str,
    now: i64,
) -> u64 {
    records
        .into_iter()
        .filter(|record| counts_toward(record, resource, now))
        .count() as u64
}

pub fn decide(active_failures: u64, settings: &BreakerSettings) -> Decision {
    if active_failures >= u64::from(settings.error_threshold()) {
        Decision::Open
    } else {
        Decision::Closed
    }
}
