use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NOTIFICATION_SOURCE: &str = "eventBridge.circuitBreaker";
pub const NOTIFICATION_DETAIL_TYPE: &str = "httpcall";
pub const FAILURE_STATUS: &str = "fail";

pub const DEFAULT_ERROR_THRESHOLD: u32 = 3;
pub const DEFAULT_WINDOW_SECONDS: i64 = 60;

/// One observed downstream failure. Written once by the recorder, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub request_id: String,
    pub site_url: String,
    pub error_type: String,
    pub expiration_time: i64,
}

/// Detail payload published by the gate when a permitted call fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailureNotification {
    pub status: String,
    pub site_url: String,
    #[serde(default)]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<i64>,
}

impl FailureNotification {
    pub fn failure(site_url: impl Into<String>, error_type: impl Into<String>, now: i64) -> Self {
        Self {
            status: FAILURE_STATUS.to_string(),
            site_url: site_url.into(),
            error_type: error_type.into(),
            observed_at: Some(now),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == FAILURE_STATUS
    }
}

/// Routing attributes of the bus envelope carrying a [`FailureNotification`].
pub fn matches_failure_route(source: &str, detail_type: &str) -> bool {
    source == NOTIFICATION_SOURCE && detail_type == NOTIFICATION_DETAIL_TYPE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    error_threshold: u32,
    window_seconds: i64,
}

impl BreakerSettings {
    pub fn new(error_threshold: u32, window_seconds: i64) -> Result<Self, ValidationError> {
        if error_threshold == 0 {
            return Err(ValidationError::new(
                "error_threshold must be a positive integer",
            ));
        }
        if window_seconds <= 0 {
            return Err(ValidationError::new(
                "window_seconds must be a positive integer",
            ));
        }

        Ok(Self {
            error_threshold,
            window_seconds,
        })
    }

    pub fn error_threshold(&self) -> u32 {
        self.error_threshold
    }

    pub fn window_seconds(&self) -> i64 {
        self.window_seconds
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
