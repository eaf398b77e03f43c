use breaker_core::contract::FailureNotification;

use crate::error::ChannelError;

/// At-least-once, unordered delivery of failure notifications to the recorder.
pub trait FailureChannel {
    fn publish(&self, notification: &FailureNotification) -> Result<(), ChannelError>;
}
