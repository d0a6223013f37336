//! Request execution.
//!
//! This module provides:
//! - The retry loop driving one logical call ([`RequestExecutor`])
//! - Last-request metrics reporting ([`Telemetry`], [`RequestMetrics`])
//!
//! # Retry flow
//!
//! Each attempt checks a connection out of the pool, sends the request built
//! once for the call, and releases the connection on any HTTP response or
//! evicts it on a transport error. Failures go through
//! [`RetryPolicy`](crate::retry::RetryPolicy); a retry waits through the
//! injected [`Sleeper`](crate::time::Sleeper).

mod engine;
mod telemetry;


pub use engine::RequestExecutor;
pub use telemetry::{RequestMetrics, Telemetry};
