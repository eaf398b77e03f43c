use breaker_core::contract::ValidationError;
use thiserror::Error;

pub const TIMEOUT_ERROR_TYPE: &str = "service timeout exception";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("failure store query failed: {0}")]
    Query(String),
    #[error("failure store write failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to publish failure notification: {0}")]
pub struct ChannelError(pub String);

/// Outcome of a protected call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownstreamFailure {
    #[error("downstream call timed out after {after_seconds}s")]
    Timeout { after_seconds: u64 },
    #[error("downstream call failed: {0}")]
    Failed(String),
}

impl DownstreamFailure {
    /// Classification stored on the failure record.
    pub fn error_type(&self) -> String {
        match self {
            Self::Timeout { .. } => TIMEOUT_ERROR_TYPE.to_string(),
            Self::Failed(message) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("admission decision unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("invalid failure notification: {0}")]
    InvalidNotification(String),
    #[error("failure record not persisted: {0}")]
    StoreUnavailable(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    InvalidVar { var: &'static str, message: String },
    #[error(transparent)]
    Settings(#[from] ValidationError),
}
