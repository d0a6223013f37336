//! stripe-core: request execution engine and webhook verification for the
//! Stripe API.
//!
//! The crate covers the mechanics every API call goes through:
//! pooled connections ([`pool`]), request construction ([`request`]), retries
//! with jittered backoff and idempotency keys ([`retry`], [`executor`]),
//! response and error classification ([`response`], [`error`]), plus inbound
//! webhook signature verification ([`webhook`]).
//!
//! # Example
//!
//! ```no_run
//! use stripe_core::config::ClientConfig;
//! use stripe_core::executor::RequestExecutor;
//! use stripe_core::request::{Params, RequestOptions};
//!
//! # async fn example() -> stripe_core::error::Result<()> {
//! let config = ClientConfig::builder().api_key("sk_test_123").build();
//! let executor = RequestExecutor::from_config(config)?;
//!
//! let params = Params::new()
//!     .with("email", "jenny@example.com")
//!     .with("metadata", Params::new().with("tier", "gold"));
//! let result = executor
//!     .post("/v1/customers", &params, RequestOptions::new())
//!     .await?;
//! println!("{}", result.body["id"]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod request;
pub mod response;
pub mod retry;
pub mod time;
pub mod transport;
pub mod webhook;

pub use config::{AppInfo, ClientConfig};
pub use error::{ApiErrorInfo, Error, ErrorKind, Result};
pub use executor::RequestExecutor;
pub use request::{ParamValue, Params, RequestOptions};
pub use response::{ApiObject, ApiResult, ObjectRegistry, Record};
pub use webhook::{Event, WebhookVerifier};
