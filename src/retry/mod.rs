//! Retry decisions for the request executor.
//!
//! [`RetryPolicy`] is a pure function of the attempt count, the failure class
//! and the server's hints. [`RetryState`] tracks one logical call.

mod policy;
mod state;

#[cfg(test)]
mod policy_tests;

pub use policy::{
    Failure, FailureClass, RetryDecision, RetryPolicy, parse_retry_after, parse_should_retry,
};
pub use state::RetryState;
