//! The request executor: one logical call, many attempts.

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use tokio::time::Instant;

use super::telemetry::Telemetry;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pool::{ConnectionPool, PoolSettings};
use crate::request::{MultipartEncoder, Params, RequestBuilder, RequestOptions, ResolvedOptions};
use crate::response::{ApiResult, parse_response};
use crate::retry::{
    Failure, RetryDecision, RetryPolicy, RetryState, parse_retry_after, parse_should_retry,
};
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{
    Connector, HttpRequest, HttpResponse, ReqwestConnector, Transport, TransportError,
    TransportSettings,
};

/// Response header carrying the server's retry hint.
const SHOULD_RETRY_HEADER: &str = "stripe-should-retry";

/// Executes API calls with pooling, retries and timeouts.
///
/// The executor is shared by reference (or `Arc`) between tasks; each call
/// keeps its own retry state and only the connection pool and the telemetry
/// cell are shared.
///
/// # Type Parameters
///
/// - `C`: Opens connections (production: [`ReqwestConnector`])
/// - `S`: Waits between attempts (production: [`TokioSleeper`])
pub struct RequestExecutor<C: Connector, S: Sleeper = TokioSleeper> {
    config: Arc<ClientConfig>,
    builder: RequestBuilder,
    pool: Arc<ConnectionPool<C>>,
    sleeper: S,
    telemetry: Telemetry,
}

impl RequestExecutor<ReqwestConnector> {
    /// Creates an executor backed by reqwest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the transport cannot be configured
    /// (for example an unreadable CA bundle).
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let settings = TransportSettings::from_config(&config)
            .map_err(|source| Error::Connection {
                attempts: 0,
                source,
            })?;
        Ok(Self::new(config, ReqwestConnector::new(settings)))
    }
}

impl<C: Connector> RequestExecutor<C> {
    /// Creates an executor that opens connections through `connector`.
    pub fn new(config: ClientConfig, connector: C) -> Self {
        let config = Arc::new(config);
        let pool = ConnectionPool::new(connector, PoolSettings::from_config(&config));
        Self {
            builder: RequestBuilder::new(Arc::clone(&config)),
            telemetry: Telemetry::new(config.enable_telemetry),
            pool: Arc::new(pool),
            sleeper: TokioSleeper,
            config,
        }
    }
}

impl<C: Connector, S: Sleeper> RequestExecutor<C, S> {
    /// Replaces the sleeper used between attempts.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RequestExecutor<C, S2> {
        RequestExecutor {
            config: self.config,
            builder: self.builder,
            pool: self.pool,
            sleeper,
            telemetry: self.telemetry,
        }
    }

    /// Replaces the multipart encoder used for file uploads.
    #[must_use]
    pub fn with_multipart(mut self, encoder: Arc<dyn MultipartEncoder>) -> Self {
        self.builder = RequestBuilder::with_multipart(Arc::clone(&self.config), encoder);
        self
    }

    /// Returns the process-wide configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the shared connection pool.
    pub fn pool(&self) -> &ConnectionPool<C> {
        &self.pool
    }

    /// Sends a GET request; `params` go in the query string.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn get(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.raw_request(Method::GET, path, params, options).await
    }

    /// Sends a POST request; `params` go in the body.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn post(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.raw_request(Method::POST, path, params, options).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn delete(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.raw_request(Method::DELETE, path, params, options).await
    }

    /// GET in preview mode.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn preview_get(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.get(path, params, options.into_preview()).await
    }

    /// POST in preview mode; the body is JSON.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn preview_post(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.post(path, params, options.into_preview()).await
    }

    /// DELETE in preview mode.
    ///
    /// # Errors
    ///
    /// See [`raw_request`](Self::raw_request).
    pub async fn preview_delete(
        &self,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        self.delete(path, params, options.into_preview()).await
    }

    /// Executes one logical call.
    ///
    /// Options are layered over the client config. POST calls without an
    /// idempotency key get a fresh UUIDv4 key, reused by every retry of this
    /// call. The request is built once and re-sent on retries.
    ///
    /// # Errors
    ///
    /// - [`Error::Build`] if the request cannot be built (nothing is sent)
    /// - [`Error::Api`] for an error response, after retries where they apply
    /// - [`Error::Connection`] if the API could not be reached within budget
    /// - [`Error::Timeout`] if an attempt or the call deadline timed out
    pub async fn raw_request(
        &self,
        method: Method,
        path: &str,
        params: &Params,
        options: RequestOptions,
    ) -> Result<ApiResult> {
        let mut resolved = options.resolve(&self.config);
        if method == Method::POST && resolved.idempotency_key.is_none() {
            resolved.idempotency_key = Some(uuid::Uuid::new_v4().to_string());
        }
        let request = self.builder.build(&method, path, params, &resolved)?;

        let mut state = RetryState::start();
        let Some(deadline) = resolved.deadline else {
            return self.execute(&request, &resolved, &mut state).await;
        };

        let outcome = tokio::time::timeout(deadline, self.execute(&request, &resolved, &mut state))
            .await;
        outcome.unwrap_or_else(|_| {
            tracing::warn!(
                "{method} {path} exceeded its {deadline:?} deadline after {} attempt(s)",
                state.attempts_made()
            );
            Err(Error::Timeout {
                elapsed: state.elapsed(),
                attempts: state.attempts_made(),
            })
        })
    }

    async fn execute(
        &self,
        request: &HttpRequest,
        options: &ResolvedOptions,
        state: &mut RetryState,
    ) -> Result<ApiResult> {
        let policy: RetryPolicy = self
            .config
            .retry_policy()
            .with_max_retries(options.max_retries);
        let idempotent = options.idempotency_key.is_some();
        let host = request.host_key();

        loop {
            tracing::debug!(
                "Request attempt {}/{}: {} {}",
                state.attempts_made(),
                policy.max_attempts(),
                request.method,
                request.url.path()
            );

            let mut outgoing = request.clone();
            self.telemetry.attach(&mut outgoing);
            let started = Instant::now();

            let (failure, error) = match self
                .attempt(&host, outgoing, options.attempt_timeout)
                .await
            {
                Ok(response) => match self.classify(response, started.elapsed(), state) {
                    Ok(result) => return Ok(result),
                    Err(Classified::Terminal(error)) => return Err(error),
                    Err(Classified::Retryable(failure, error)) => (failure, error),
                },
                Err(e) if !e.is_transient() => {
                    return Err(Error::Connection {
                        attempts: state.attempts_made(),
                        source: e,
                    });
                }
                Err(TransportError::Timeout) => (
                    Failure::transport(),
                    Error::Timeout {
                        elapsed: state.elapsed(),
                        attempts: state.attempts_made(),
                    },
                ),
                Err(e) => (
                    Failure::transport(),
                    Error::Connection {
                        attempts: state.attempts_made(),
                        source: e,
                    },
                ),
            };

            state.record_failure(error.kind());
            let decision =
                policy.decide(state.attempt(), &failure, idempotent, &mut rand::thread_rng());

            match decision {
                RetryDecision::Retry { delay } => {
                    tracing::warn!(
                        "{} {} failed ({error}), retrying in {delay:?} (retry {}/{})",
                        request.method,
                        request.url.path(),
                        state.attempt() + 1,
                        policy.max_retries
                    );
                    self.sleeper.sleep(delay).await;
                    state.advance();
                }
                RetryDecision::Stop => {
                    tracing::debug!(
                        "{} {} failed after {} attempt(s): {error}",
                        request.method,
                        request.url.path(),
                        state.attempts_made()
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Runs one attempt: checks out a connection, sends, and returns the
    /// connection to the pool on any HTTP response. Connections that fail or
    /// time out are evicted.
    async fn attempt(
        &self,
        host: &str,
        request: HttpRequest,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let conn = self.pool.acquire(host).await?;
        let sent = tokio::time::timeout(timeout, conn.transport().send(request)).await;

        match sent {
            Ok(Ok(response)) => {
                self.pool.release(conn);
                Ok(response)
            }
            Ok(Err(e)) => {
                tracing::debug!("Evicting connection {} after error: {e}", conn.id());
                self.pool.evict(conn);
                Err(e)
            }
            Err(_) => {
                tracing::debug!("Evicting connection {} after {timeout:?} timeout", conn.id());
                self.pool.evict(conn);
                Err(TransportError::Timeout)
            }
        }
    }

    fn classify(
        &self,
        response: HttpResponse,
        elapsed: Duration,
        state: &RetryState,
    ) -> std::result::Result<ApiResult, Classified> {
        let retry_after = response.header("retry-after").and_then(parse_retry_after);
        let should_retry = response
            .header(SHOULD_RETRY_HEADER)
            .and_then(parse_should_retry);

        match parse_response(response) {
            Ok(result) => {
                tracing::debug!(
                    "Response {} in {elapsed:?} (request-id: {}, attempt {})",
                    result.status.as_u16(),
                    result.request_id.as_deref().unwrap_or("-"),
                    state.attempts_made()
                );
                self.telemetry.record(result.request_id.as_deref(), elapsed);
                Ok(result)
            }
            Err(info) => {
                let Some(status) = info.http_status.filter(|s| !s.is_success()) else {
                    return Err(Classified::Terminal(Error::Api(info)));
                };
                let mut failure = Failure::status(status);
                if let Some(delay) = retry_after {
                    failure = failure.with_retry_after(delay);
                }
                if let Some(hint) = should_retry {
                    failure = failure.with_should_retry(hint);
                }
                Err(Classified::Retryable(failure, Error::Api(info)))
            }
        }
    }
}

/// Outcome of a failed HTTP exchange, before the retry decision.
enum Classified {
    /// Never worth retrying (for example an unparseable 2xx body).
    Terminal(Error),
    /// Handed to the retry policy, which may still stop.
    Retryable(Failure, Error),
}

impl<C: Connector, S: Sleeper> std::fmt::Debug for RequestExecutor<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .field("pool", &self.pool.stats())
            .field("telemetry", &self.telemetry.is_enabled())
            .finish_non_exhaustive()
    }
}
