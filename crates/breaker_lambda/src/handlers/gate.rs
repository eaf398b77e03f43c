use breaker_core::contract::{BreakerSettings, FailureNotification};
use breaker_core::window::{decide, Decision};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::adapters::channel::FailureChannel;
use crate::adapters::downstream::Downstream;
use crate::adapters::failure_store::FailureStore;
use crate::config::{GateConfig, StoreFailurePolicy};
use crate::error::GateError;

pub const CIRCUIT_OPEN_MESSAGE: &str =
    "This service has been experiencing issues for a while, we have closed the circuit";
pub const TRANSIENT_FAILURE_MESSAGE: &str =
    "Something appears to be wrong with this service, please try again later";
pub const ADMISSION_UNAVAILABLE_MESSAGE: &str =
    "Unable to determine circuit state, please try again later";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub struct GateDependencies<'a> {
    pub store: &'a dyn FailureStore,
    pub channel: &'a dyn FailureChannel,
    pub downstream: &'a dyn Downstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Circuit closed and the downstream call succeeded.
    Forwarded { body: String },
    /// Circuit open; the downstream was not called.
    ShortCircuited,
    /// Circuit closed but the downstream call failed.
    DownstreamFailed { error_type: String, published: bool },
    /// The failure count could not be read and the policy is to surface it.
    AdmissionUnavailable { reason: String },
}

/// Reads the active failure count for `resource` and derives the decision.
///
/// Never writes to the store. A store failure is returned as
/// [`GateError::StoreUnavailable`] rather than folded into either decision.
pub fn evaluate(
    resource: &str,
    now: i64,
    settings: &BreakerSettings,
    store: &dyn FailureStore,
) -> Result<Decision, GateError> {
    let active_failures = store.count_active(resource, now)?;
    let decision = decide(active_failures, settings);
    info!(
        event = "gate_evaluated",
        resource,
        now,
        active_failures,
        error_threshold = settings.error_threshold(),
        decision = decision.as_str(),
    );
    Ok(decision)
}

pub fn run_gate(config: &GateConfig, now: i64, deps: &GateDependencies<'_>) -> GateOutcome {
    let resource = config.resource.as_str();
    let decision = match evaluate(resource, now, &config.settings, deps.store) {
        Ok(decision) => decision,
        Err(GateError::StoreUnavailable(store_error)) => {
            let policy = config.store_failure_policy;
            match policy {
                StoreFailurePolicy::Surface => {
                    error!(
                        event = "gate_admission_unavailable",
                        resource,
                        error = %store_error,
                    );
                    return GateOutcome::AdmissionUnavailable {
                        reason: store_error.to_string(),
                    };
                }
                StoreFailurePolicy::FailOpen | StoreFailurePolicy::FailClosed => {
                    warn!(
                        event = "gate_store_policy_applied",
                        resource,
                        policy = policy.as_str(),
                        error = %store_error,
                    );
                    if policy == StoreFailurePolicy::FailOpen {
                        Decision::Closed
                    } else {
                        Decision::Open
                    }
                }
            }
        }
    };

    if !decision.permits_call() {
        info!(event = "gate_short_circuited", resource);
        return GateOutcome::ShortCircuited;
    }

    match deps.downstream.call(resource) {
        Ok(body) => {
            info!(event = "downstream_succeeded", resource);
            GateOutcome::Forwarded { body }
        }
        Err(failure) => {
            let error_type = failure.error_type();
            warn!(event = "downstream_failed", resource, error = %failure);

            let notification = FailureNotification::failure(resource, error_type.clone(), now);
            let published = match deps.channel.publish(&notification) {
                Ok(()) => {
                    info!(event = "failure_published", resource, error_type = %error_type);
                    true
                }
                Err(channel_error) => {
                    error!(
                        event = "failure_publish_failed",
                        resource,
                        error = %channel_error,
                    );
                    false
                }
            };

            GateOutcome::DownstreamFailed {
                error_type,
                published,
            }
        }
    }
}

pub fn gate_response(outcome: &GateOutcome) -> ApiGatewayResponse {
    match outcome {
        GateOutcome::Forwarded { body } => text_response(200, body),
        GateOutcome::ShortCircuited => text_response(500, CIRCUIT_OPEN_MESSAGE),
        GateOutcome::DownstreamFailed { .. } => text_response(500, TRANSIENT_FAILURE_MESSAGE),
        GateOutcome::AdmissionUnavailable { .. } => {
            text_response(503, ADMISSION_UNAVAILABLE_MESSAGE)
        }
    }
}

pub fn handle_gate_request(
    config: &GateConfig,
    now: i64,
    deps: &GateDependencies<'_>,
) -> ApiGatewayResponse {
    gate_response(&run_gate(config, now, deps))
}

fn text_response(status_code: u16, body: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "text/plain"}),
        body: body.to_string(),
    }
}
