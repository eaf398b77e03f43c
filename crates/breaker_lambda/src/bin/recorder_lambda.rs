use aws_lambda_events::event::eventbridge::EventBridgeEvent;
use breaker_core::contract::FailureNotification;
use breaker_lambda::adapters::dynamodb::{DynamoFailureStore, DEFAULT_INDEX_NAME};
use breaker_lambda::adapters::request_id::UuidRequestIds;
use breaker_lambda::config::RecorderConfig;
use breaker_lambda::handlers::recorder::{handle_failure_event, RecordOutcome};
use breaker_lambda::telemetry::init_tracing;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::{json, Value};

struct RecorderRuntime {
    config: RecorderConfig,
    store: DynamoFailureStore,
}

fn handle_request(
    event: LambdaEvent<EventBridgeEvent<FailureNotification>>,
    runtime: &RecorderRuntime,
) -> Result<Value, Error> {
    let bus_event = event.payload;
    let outcome = handle_failure_event(
        &bus_event.source,
        &bus_event.detail_type,
        &bus_event.detail,
        Utc::now().timestamp(),
        &runtime.config.settings,
        &runtime.store,
        &UuidRequestIds,
    )
    .map_err(|error| Error::from(error.to_string()))?;

    Ok(match outcome {
        RecordOutcome::Recorded(record) => json!({
            "status": "recorded",
            "request_id": record.request_id,
            "expiration_time": record.expiration_time,
        }),
        RecordOutcome::Ignored { reason } => json!({
            "status": "ignored",
            "reason": reason,
        }),
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = RecorderConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let runtime = RecorderRuntime {
        store: DynamoFailureStore::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            config.table_name.clone(),
            DEFAULT_INDEX_NAME,
        ),
        config,
    };
    let runtime = &runtime;

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<EventBridgeEvent<FailureNotification>>| async move {
            handle_request(event, runtime)
        },
    ))
    .await
}
