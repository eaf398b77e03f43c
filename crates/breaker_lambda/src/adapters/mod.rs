use std::future::Future;

pub mod channel;
pub mod downstream;
pub mod dynamodb;
pub mod eventbridge;
pub mod failure_store;
pub mod request_id;

/// Drives an SDK future to completion from a synchronous adapter call.
///
/// Requires the multi-threaded tokio runtime the Lambda binaries start.
pub(crate) fn block_on_current<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
