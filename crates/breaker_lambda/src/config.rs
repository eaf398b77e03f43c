//! Cold-start configuration read from the Lambda environment.
//!
//! Values are fixed for the lifetime of the process. Both handlers must see the
//! same `WINDOW_SECONDS`, otherwise the recorder's expiry and the gate's window
//! disagree.

use std::str::FromStr;
use std::time::Duration;

use breaker_core::contract::{BreakerSettings, DEFAULT_ERROR_THRESHOLD, DEFAULT_WINDOW_SECONDS};

use crate::adapters::downstream::DEFAULT_DOWNSTREAM_TIMEOUT;
use crate::adapters::dynamodb::{DEFAULT_INDEX_NAME, DEFAULT_TABLE_NAME};
use crate::adapters::eventbridge::DEFAULT_EVENT_BUS_NAME;
use crate::error::ConfigError;

pub const DEFAULT_PROTECTED_RESOURCE: &str = "www.google.com";

/// What the gate does when the failure count cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreFailurePolicy {
    /// Report that no admission decision could be made.
    #[default]
    Surface,
    /// Attempt the call as if the circuit were closed.
    FailOpen,
    /// Refuse the call as if the circuit were open.
    FailClosed,
}

impl StoreFailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::FailOpen => "fail-open",
            Self::FailClosed => "fail-closed",
        }
    }
}

impl FromStr for StoreFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "fail-open" | "fail_open" => Ok(Self::FailOpen),
            "fail-closed" | "fail_closed" => Ok(Self::FailClosed),
            other => Err(format!(
                "unknown policy '{other}', expected surface, fail-open or fail-closed"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub resource: String,
    pub settings: BreakerSettings,
    pub downstream_url: Option<String>,
    pub downstream_timeout: Duration,
    pub simulate_outage: bool,
    pub store_failure_policy: StoreFailurePolicy,
    pub table_name: String,
    pub index_name: String,
    pub event_bus_name: String,
}

impl GateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_seconds = parse_var(
            &lookup,
            "DOWNSTREAM_TIMEOUT_SECONDS",
            DEFAULT_DOWNSTREAM_TIMEOUT.as_secs(),
        )?;
        if timeout_seconds == 0 {
            return Err(ConfigError::InvalidVar {
                var: "DOWNSTREAM_TIMEOUT_SECONDS",
                message: "must be a positive integer".to_string(),
            });
        }

        Ok(Self {
            resource: string_var(&lookup, "PROTECTED_RESOURCE")
                .unwrap_or_else(|| DEFAULT_PROTECTED_RESOURCE.to_string()),
            settings: settings_from_lookup(&lookup)?,
            downstream_url: string_var(&lookup, "DOWNSTREAM_URL"),
            downstream_timeout: Duration::from_secs(timeout_seconds),
            simulate_outage: parse_var(&lookup, "SIMULATE_OUTAGE", false)?,
            store_failure_policy: parse_var(
                &lookup,
                "STORE_FAILURE_POLICY",
                StoreFailurePolicy::default(),
            )?,
            table_name: string_var(&lookup, "FAILURE_TABLE_NAME")
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            index_name: string_var(&lookup, "FAILURE_INDEX_NAME")
                .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            event_bus_name: string_var(&lookup, "EVENT_BUS_NAME")
                .unwrap_or_else(|| DEFAULT_EVENT_BUS_NAME.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    pub settings: BreakerSettings,
    pub table_name: String,
}

impl RecorderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            settings: settings_from_lookup(&lookup)?,
            table_name: string_var(&lookup, "FAILURE_TABLE_NAME")
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
        })
    }
}

fn settings_from_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<BreakerSettings, ConfigError> {
    let error_threshold = parse_var(lookup, "ERROR_THRESHOLD", DEFAULT_ERROR_THRESHOLD)?;
    let window_seconds = parse_var(lookup, "WINDOW_SECONDS", DEFAULT_WINDOW_SECONDS)?;
    Ok(BreakerSettings::new(error_threshold, window_seconds)?)
}

fn string_var(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_var(lookup, var) {
        Some(value) => value.parse().map_err(|error: T::Err| ConfigError::InvalidVar {
            var,
            message: error.to_string(),
        }),
        None => Ok(default),
    }
}
