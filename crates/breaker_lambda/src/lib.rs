//! AWS-oriented adapters and handlers for the windowed circuit breaker.
//!
//! This crate owns runtime integration details (Lambda handlers, the DynamoDB
//! failure store, the EventBridge failure channel, and the protected downstream
//! call). Window semantics and the admission decision live in `breaker_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod telemetry;
