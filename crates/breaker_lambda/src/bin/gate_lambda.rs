use breaker_lambda::adapters::downstream::{Downstream, HttpDownstream, SimulatedOutage};
use breaker_lambda::adapters::dynamodb::DynamoFailureStore;
use breaker_lambda::adapters::eventbridge::EventBridgeChannel;
use breaker_lambda::config::GateConfig;
use breaker_lambda::handlers::gate::{handle_gate_request, ApiGatewayResponse, GateDependencies};
use breaker_lambda::telemetry::init_tracing;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct GateRuntime {
    config: GateConfig,
    store: DynamoFailureStore,
    channel: EventBridgeChannel,
    downstream: Box<dyn Downstream + Send + Sync>,
}

fn handle_request(event: LambdaEvent<Value>, runtime: &GateRuntime) -> ApiGatewayResponse {
    tracing::debug!(event = "gate_request_received", request_id = %event.context.request_id);

    let deps = GateDependencies {
        store: &runtime.store,
        channel: &runtime.channel,
        downstream: runtime.downstream.as_ref(),
    };
    handle_gate_request(&runtime.config, Utc::now().timestamp(), &deps)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = GateConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

    let downstream: Box<dyn Downstream + Send + Sync> = if config.simulate_outage {
        Box::new(SimulatedOutage {
            timeout: config.downstream_timeout,
        })
    } else {
        Box::new(HttpDownstream::new(
            config.downstream_url.clone(),
            config.downstream_timeout,
        ))
    };

    let runtime = GateRuntime {
        store: DynamoFailureStore::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            config.table_name.clone(),
            config.index_name.clone(),
        ),
        channel: EventBridgeChannel::new(
            aws_sdk_eventbridge::Client::new(&aws_config),
            config.event_bus_name.clone(),
        ),
        downstream,
        config,
    };
    let runtime = &runtime;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<ApiGatewayResponse, Error>(handle_request(event, runtime))
    }))
    .await
}
