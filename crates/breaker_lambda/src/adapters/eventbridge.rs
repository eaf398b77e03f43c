use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use breaker_core::contract::{FailureNotification, NOTIFICATION_DETAIL_TYPE, NOTIFICATION_SOURCE};

use crate::adapters::block_on_current;
use crate::adapters::channel::FailureChannel;
use crate::error::ChannelError;

pub const DEFAULT_EVENT_BUS_NAME: &str = "default";

#[derive(Clone)]
pub struct EventBridgeChannel {
    client: aws_sdk_eventbridge::Client,
    event_bus_name: String,
}

impl EventBridgeChannel {
    pub fn new(client: aws_sdk_eventbridge::Client, event_bus_name: impl Into<String>) -> Self {
        Self {
            client,
            event_bus_name: event_bus_name.into(),
        }
    }
}

impl FailureChannel for EventBridgeChannel {
    fn publish(&self, notification: &FailureNotification) -> Result<(), ChannelError> {
        let detail = serde_json::to_string(notification)
            .map_err(|error| ChannelError(format!("failed to serialize detail: {error}")))?;
        let entry = PutEventsRequestEntry::builder()
            .event_bus_name(self.event_bus_name.clone())
            .source(NOTIFICATION_SOURCE)
            .detail_type(NOTIFICATION_DETAIL_TYPE)
            .detail(detail)
            .build();
        let client = self.client.clone();

        block_on_current(async move {
            let output = client
                .put_events()
                .entries(entry)
                .send()
                .await
                .map_err(|error| ChannelError(format!("put_events request failed: {error}")))?;

            if output.failed_entry_count() > 0 {
                let reason = output
                    .entries()
                    .iter()
                    .find_map(|entry| entry.error_message())
                    .unwrap_or("unknown error");
                return Err(ChannelError(format!("entry rejected by event bus: {reason}")));
            }

            Ok::<(), ChannelError>(())
        })
    }
}
