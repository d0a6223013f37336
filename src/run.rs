//! Application execution logic.
//!
//! This module turns a parsed subcommand into one API call or one webhook
//! verification and renders the outcome for the terminal.

use std::io::Read;
use std::path::{Path, PathBuf};

use http::Method;
use thiserror::Error;

use stripe_core::RequestExecutor;
use stripe_core::config::{ClientConfig, Command, ValidatedConfig, WebhookSettings};
use stripe_core::error::Error as CoreError;
use stripe_core::request::{Params, RequestOptions, decode_form};
use stripe_core::response::{ApiObject, ApiResult, ObjectRegistry};
use stripe_core::webhook::{SignatureVerificationError, WebhookVerifier};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A `-d` argument is not `key=value`.
    #[error("Invalid parameter '{0}': expected 'key=value'")]
    InvalidParam(String),

    /// A `-H` argument is not a header.
    #[error("Invalid header '{0}': expected 'Key: Value' or 'Key=Value'")]
    InvalidHeader(String),

    /// The method is not one the API accepts.
    #[error("Unsupported method '{0}': expected GET, POST, or DELETE")]
    InvalidMethod(String),

    /// The webhook payload could not be read.
    #[error("Failed to read payload '{}': {source}", path.display())]
    PayloadRead {
        /// Payload path (`-` for stdin)
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The API call failed.
    #[error(transparent)]
    Api(#[from] CoreError),

    /// The webhook was rejected.
    #[error("Webhook rejected: {0}")]
    Webhook(#[from] SignatureVerificationError),
}

/// A parsed `request` subcommand.
#[derive(Debug)]
struct RequestTask {
    method: Method,
    path: String,
    params: Params,
    options: RequestOptions,
}

impl RequestTask {
    fn from_args(
        method: &str,
        path: String,
        data: &[String],
        idempotency_key: Option<String>,
        headers: &[String],
        preview: bool,
    ) -> Result<Self, RunError> {
        let mut options = RequestOptions::new();
        if let Some(key) = idempotency_key {
            options = options.with_idempotency_key(key);
        }
        for header in headers {
            let (name, value) = parse_header(header)?;
            options = options.with_header(name, value);
        }
        if preview {
            options = options.into_preview();
        }

        Ok(Self {
            method: parse_method(method)?,
            path,
            params: parse_params(data)?,
            options,
        })
    }
}

/// Executes the selected command and returns what to print on stdout.
///
/// `init` is handled before configuration is loaded and yields no output
/// here.
///
/// # Errors
///
/// Returns an error if arguments are malformed, the API call fails, the
/// payload cannot be read, or the webhook is rejected.
pub async fn execute(command: Command, config: ValidatedConfig) -> Result<String, RunError> {
    match command {
        Command::Init { .. } => Ok(String::new()),
        Command::Request {
            method,
            path,
            data,
            idempotency_key,
            headers,
            preview,
        } => {
            let task =
                RequestTask::from_args(&method, path, &data, idempotency_key, &headers, preview)?;
            send_request(config.client, task).await
        }
        Command::VerifyWebhook {
            signature, payload, ..
        } => {
            let body = read_payload(payload.as_deref())?;
            verify_webhook(&WebhookVerifier::new(), &body, &signature, &config.webhook)
        }
    }
}

#[cfg(not(tarpaulin_include))]
async fn send_request(client: ClientConfig, task: RequestTask) -> Result<String, RunError> {
    let executor = RequestExecutor::from_config(client)?;
    tracing::info!("{} {}", task.method, task.path);

    let result = executor
        .raw_request(task.method, &task.path, &task.params, task.options)
        .await?;

    Ok(render_result(&result, &ObjectRegistry::default()))
}

/// Logs a one-line summary of the decoded object and pretty-prints the body.
fn render_result(result: &ApiResult, registry: &ObjectRegistry) -> String {
    if let Some(object) = registry.convert(result.body.clone()) {
        tracing::info!(
            "{} ({}, request-id: {})",
            summarize(&object),
            result.status.as_u16(),
            result.request_id.as_deref().unwrap_or("-")
        );
    }
    serde_json::to_string_pretty(&result.body).unwrap_or_else(|_| result.body.to_string())
}

/// One-line description of an object, e.g. `customer cus_123`.
fn summarize(object: &ApiObject) -> String {
    match object {
        ApiObject::List(list) => format!(
            "list of {} item(s){}",
            list.data.len(),
            if list.has_more { ", more available" } else { "" }
        ),
        ApiObject::SearchResult(page) => match page.total_count {
            Some(total) => format!("search result: {} of {total}", page.data.len()),
            None => format!("search result: {} item(s)", page.data.len()),
        },
        other => other.as_record().map_or_else(String::new, |record| {
            match (record.object_type(), record.id()) {
                (Some(kind), Some(id)) => format!("{kind} {id}"),
                (Some(kind), None) => kind.to_string(),
                (None, Some(id)) => id.to_string(),
                (None, None) => "object".to_string(),
            }
        }),
    }
}

fn verify_webhook<K: stripe_core::time::Clock>(
    verifier: &WebhookVerifier<K>,
    payload: &[u8],
    signature: &str,
    settings: &WebhookSettings,
) -> Result<String, RunError> {
    let event =
        verifier.construct_event_any(payload, signature, &settings.secrets, settings.tolerance)?;
    tracing::info!("Verified event {} ({})", event.id, event.event_type);
    Ok(format!("{} {}", event.id, event.event_type))
}

fn read_payload(path: Option<&Path>) -> Result<Vec<u8>, RunError> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).map_err(|source| RunError::PayloadRead {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|source| RunError::PayloadRead {
                    path: PathBuf::from("-"),
                    source,
                })?;
            Ok(buf)
        }
    }
}

fn parse_method(s: &str) -> Result<Method, RunError> {
    match s.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "DELETE" => Ok(Method::DELETE),
        _ => Err(RunError::InvalidMethod(s.to_string())),
    }
}

/// Parses `-d key=value` arguments; bracketed keys nest as in form encoding.
fn parse_params(data: &[String]) -> Result<Params, RunError> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for item in data {
        let (key, value) = item
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| RunError::InvalidParam(item.clone()))?;
        serializer.append_pair(key, value);
    }
    decode_form(&serializer.finish()).map_err(|e| RunError::Api(CoreError::from(e)))
}

fn parse_header(s: &str) -> Result<(String, String), RunError> {
    // Try "Key: Value" format first, since values may contain '='
    let (name, value) = s
        .split_once(':')
        .or_else(|| s.split_once('='))
        .ok_or_else(|| RunError::InvalidHeader(s.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(RunError::InvalidHeader(s.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
