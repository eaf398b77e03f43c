//! Shared circuit-breaker domain primitives.
//!
//! This crate owns the failure-record model, the rolling-window predicate, and
//! the admission decision. It intentionally excludes AWS SDK and Lambda runtime
//! concerns so both handlers agree on one window definition.

pub mod contract;
pub mod window;
