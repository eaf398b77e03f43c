use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, Select};
use breaker_core::contract::FailureRecord;

use crate::adapters::block_on_current;
use crate::adapters::failure_store::FailureStore;
use crate::error::StoreError;

pub const DEFAULT_TABLE_NAME: &str = "circuitBreaker";
pub const DEFAULT_INDEX_NAME: &str = "UrlIndex";

const ATTR_REQUEST_ID: &str = "RequestID";
const ATTR_SITE_URL: &str = "SiteUrl";
const ATTR_ERROR_TYPE: &str = "ErrorType";
const ATTR_EXPIRATION_TIME: &str = "ExpirationTime";

/// Failure records in a DynamoDB table keyed by `RequestID`, with a
/// `SiteUrl`/`ExpirationTime` secondary index and `ExpirationTime` as the TTL
/// attribute. TTL purges lag; the key condition alone decides what counts.
#[derive(Clone)]
pub struct DynamoFailureStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
    index_name: String,
}

impl DynamoFailureStore {
    pub fn new(
        client: aws_sdk_dynamodb::Client,
        table_name: impl Into<String>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            index_name: index_name.into(),
        }
    }
}

impl FailureStore for DynamoFailureStore {
    fn count_active(&self, resource: &str, now: i64) -> Result<u64, StoreError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let index_name = self.index_name.clone();
        let site_url = resource.to_string();

        block_on_current(async move {
            let mut total = 0u64;
            let mut start_key: Option<HashMap<String, AttributeValue>> = None;

            loop {
                let output = client
                    .query()
                    .table_name(&table_name)
                    .index_name(&index_name)
                    .key_condition_expression("SiteUrl = :url and ExpirationTime > :now")
                    .expression_attribute_values(":url", AttributeValue::S(site_url.clone()))
                    .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
                    .select(Select::Count)
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|error| {
                        StoreError::Query(format!("failed to query {index_name}: {error}"))
                    })?;

                total += u64::try_from(output.count()).unwrap_or(0);

                match output.last_evaluated_key() {
                    Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                    _ => break,
                }
            }

            Ok::<u64, StoreError>(total)
        })
    }

    fn insert(&self, record: &FailureRecord) -> Result<(), StoreError> {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        let item = record_item(record);

        block_on_current(async move {
            client
                .put_item()
                .table_name(&table_name)
                .set_item(Some(item))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    StoreError::Write(format!("failed to put item into {table_name}: {error}"))
                })
        })
    }
}

fn record_item(record: &FailureRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            ATTR_REQUEST_ID.to_string(),
            AttributeValue::S(record.request_id.clone()),
        ),
        (
            ATTR_SITE_URL.to_string(),
            AttributeValue::S(record.site_url.clone()),
        ),
        (
            ATTR_ERROR_TYPE.to_string(),
            AttributeValue::S(record.error_type.clone()),
        ),
        (
            ATTR_EXPIRATION_TIME.to_string(),
            AttributeValue::N(record.expiration_time.to_string()),
        ),
    ])
}
