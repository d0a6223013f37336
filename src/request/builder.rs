//! Turns `(method, path, params, options)` into a wire-ready request.

use std::sync::Arc;

use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT};
use http::{HeaderMap, Method};
use serde::Serialize;
use thiserror::Error;

use super::encode::{encode_form, flatten};
use super::multipart::{FormDataEncoder, MultipartEncoder};
use super::options::{ApiMode, ResolvedOptions};
use super::params::Params;
use crate::config::{AppInfo, ClientConfig};
use crate::transport::HttpRequest;

/// Version of this library, reported in the user agent.
pub const BINDINGS_VERSION: &str = env!("CARGO_PKG_VERSION");

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Header names used on every request.
pub mod headers {
    /// API version header.
    pub const STRIPE_VERSION: &str = "stripe-version";
    /// Connected account header.
    pub const STRIPE_ACCOUNT: &str = "stripe-account";
    /// Idempotency key header.
    pub const IDEMPOTENCY_KEY: &str = "idempotency-key";
    /// JSON client description header.
    pub const CLIENT_USER_AGENT: &str = "x-stripe-client-user-agent";
    /// Last-request metrics header.
    pub const CLIENT_TELEMETRY: &str = "x-stripe-client-telemetry";
}

/// A request rejected before it was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No API key in the call options or the config.
    #[error(
        "No API key provided. Set an API key in the config or pass one with the request options"
    )]
    MissingApiKey,

    /// The API key contains whitespace.
    #[error("API key is invalid: it contains whitespace")]
    InvalidApiKey,

    /// A header name or value is not valid HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The path does not form a valid URL with the base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A parameter cannot be encoded for this request.
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// The body could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Builds [`HttpRequest`]s.
///
/// Pure with respect to its inputs: the same method, path, params and
/// resolved options always produce the same request. Idempotency keys are
/// chosen by the caller (the executor), never here.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    config: Arc<ClientConfig>,
    multipart: Arc<dyn MultipartEncoder>,
    user_agent: String,
    client_user_agent: String,
}

#[derive(Serialize)]
struct ClientUserAgent<'a> {
    bindings_version: &'a str,
    lang: &'a str,
    publisher: &'a str,
    platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    application: Option<&'a AppInfo>,
}

impl RequestBuilder {
    /// Creates a builder with the default multipart encoder.
    #[must_use]
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self::with_multipart(config, Arc::new(FormDataEncoder::new()))
    }

    /// Creates a builder with a custom multipart encoder.
    #[must_use]
    pub fn with_multipart(config: Arc<ClientConfig>, multipart: Arc<dyn MultipartEncoder>) -> Self {
        let user_agent = match &config.app_info {
            Some(info) => format!(
                "Stripe/v1 RustBindings/{BINDINGS_VERSION} {}",
                info.user_agent_fragment()
            ),
            None => format!("Stripe/v1 RustBindings/{BINDINGS_VERSION}"),
        };
        let client_user_agent = serde_json::to_string(&ClientUserAgent {
            bindings_version: BINDINGS_VERSION,
            lang: "rust",
            publisher: "stripe",
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            application: config.app_info.as_ref(),
        })
        .unwrap_or_default();

        Self {
            config,
            multipart,
            user_agent,
            client_user_agent,
        }
    }

    /// The client config requests are built against.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The `User-Agent` value sent on every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Builds the wire request.
    ///
    /// GET and DELETE carry params in the query string. Other methods carry
    /// them in the body: form-encoded, multipart when a file is present, or
    /// JSON in preview mode.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for a missing or malformed API key, an invalid
    /// URL, unencodable params, or invalid header overrides.
    pub fn build(
        &self,
        method: &Method,
        path: &str,
        params: &Params,
        options: &ResolvedOptions,
    ) -> Result<HttpRequest, BuildError> {
        let api_key = match options.api_key.as_deref() {
            None | Some("") => return Err(BuildError::MissingApiKey),
            Some(key) if key.chars().any(char::is_whitespace) => {
                return Err(BuildError::InvalidApiKey);
            }
            Some(key) => key,
        };

        let mut url = endpoint_url(&options.base_url, path)
            .map_err(|e| BuildError::InvalidUrl(format!("{path}: {e}")))?;

        let in_query = matches!(*method, Method::GET | Method::DELETE | Method::HEAD);
        let (content_type, body) = if in_query {
            if !params.is_empty() {
                let encoded = encode_form(params)?;
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                    _ => encoded,
                };
                url.set_query(Some(&query));
            }
            (default_content_type(options.api_mode).to_string(), None)
        } else {
            self.encode_body(params, options.api_mode)?
        };

        let mut request = HttpRequest::new(method.clone(), url);
        request.headers = self.base_headers(api_key, &content_type, options)?;
        request.body = body;
        Ok(request)
    }

    fn encode_body(
        &self,
        params: &Params,
        mode: ApiMode,
    ) -> Result<(String, Option<Vec<u8>>), BuildError> {
        if mode == ApiMode::Preview {
            let json = params.to_json()?;
            let body =
                serde_json::to_vec(&json).map_err(|e| BuildError::Encoding(e.to_string()))?;
            return Ok((JSON_CONTENT_TYPE.to_string(), Some(body)));
        }

        if params.has_file() {
            let encoded = self.multipart.encode(&flatten(params))?;
            return Ok((encoded.content_type, Some(encoded.body)));
        }

        Ok((
            FORM_CONTENT_TYPE.to_string(),
            Some(encode_form(params)?.into_bytes()),
        ))
    }

    fn base_headers(
        &self,
        api_key: &str,
        content_type: &str,
        options: &ResolvedOptions,
    ) -> Result<HeaderMap, BuildError> {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, value("Authorization", &format!("Bearer {api_key}"))?);
        map.insert(CONTENT_TYPE, value("Content-Type", content_type)?);
        map.insert(USER_AGENT, value("User-Agent", &self.user_agent)?);
        map.insert(
            HeaderName::from_static(headers::CLIENT_USER_AGENT),
            value(headers::CLIENT_USER_AGENT, &self.client_user_agent)?,
        );
        map.insert(
            HeaderName::from_static(headers::STRIPE_VERSION),
            value(headers::STRIPE_VERSION, &options.api_version)?,
        );
        if let Some(key) = &options.idempotency_key {
            map.insert(
                HeaderName::from_static(headers::IDEMPOTENCY_KEY),
                value(headers::IDEMPOTENCY_KEY, key)?,
            );
        }
        if let Some(account) = &options.stripe_account {
            map.insert(
                HeaderName::from_static(headers::STRIPE_ACCOUNT),
                value(headers::STRIPE_ACCOUNT, account)?,
            );
        }

        for (name, raw) in &options.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| BuildError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            map.insert(header_name, value(name, raw)?);
        }

        Ok(map)
    }
}

/// Resolves `path` under `base`, keeping any path prefix the base carries
/// (`https://gw.example/stripe` + `/v1/charges`).
fn endpoint_url(base: &url::Url, path: &str) -> Result<url::Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefix = format!("{}/", base.path());
        base.set_path(&prefix);
    }
    base.join(path.trim_start_matches('/'))
}

const fn default_content_type(mode: ApiMode) -> &'static str {
    match mode {
        ApiMode::Standard => FORM_CONTENT_TYPE,
        ApiMode::Preview => JSON_CONTENT_TYPE,
    }
}

fn value(name: &str, raw: &str) -> Result<HeaderValue, BuildError> {
    HeaderValue::from_str(raw).map_err(|e| BuildError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
