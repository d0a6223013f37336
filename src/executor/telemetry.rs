//! Last-request metrics forwarded on the next request.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use http::HeaderValue;
use serde::Serialize;

use crate::request::headers;
use crate::transport::HttpRequest;

/// Metrics about one completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMetrics {
    /// Server-assigned request id.
    pub request_id: String,
    /// Wall time of the successful attempt in milliseconds.
    pub request_duration_ms: u64,
}

#[derive(Serialize)]
struct TelemetryPayload<'a> {
    last_request_metrics: &'a RequestMetrics,
}

impl RequestMetrics {
    /// Renders the `X-Stripe-Client-Telemetry` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        serde_json::to_string(&TelemetryPayload {
            last_request_metrics: self,
        })
        .unwrap_or_default()
    }
}

/// One-slot cell holding the metrics of the most recent successful call.
///
/// Metrics are taken when attached, so each measurement is reported at most
/// once.
#[derive(Debug, Default)]
pub struct Telemetry {
    enabled: bool,
    last: Mutex<Option<RequestMetrics>>,
}

impl Telemetry {
    /// Creates a cell; a disabled cell never records nor attaches anything.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last: Mutex::new(None),
        }
    }

    /// Returns true if metrics are collected.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stores metrics for a successful call. Calls without a request id are
    /// not recorded.
    pub fn record(&self, request_id: Option<&str>, duration: Duration) {
        let Some(request_id) = request_id.filter(|_| self.enabled) else {
            return;
        };
        let metrics = RequestMetrics {
            request_id: request_id.to_string(),
            request_duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        };
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(metrics);
    }

    /// Removes and returns the pending metrics.
    pub fn take(&self) -> Option<RequestMetrics> {
        if !self.enabled {
            return None;
        }
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Attaches pending metrics to `request` as a telemetry header.
    pub fn attach(&self, request: &mut HttpRequest) {
        let Some(metrics) = self.take() else {
            return;
        };
        match HeaderValue::from_str(&metrics.header_value()) {
            Ok(value) => {
                request.headers.insert(headers::CLIENT_TELEMETRY, value);
            }
            Err(e) => tracing::debug!("Dropping unsendable telemetry: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest::get(url::Url::parse("https://api.stripe.com/v1/balance").unwrap())
    }

    #[test]
    fn header_value_nests_metrics() {
        let metrics = RequestMetrics {
            request_id: "req_1".to_string(),
            request_duration_ms: 42,
        };

        let value: serde_json::Value = serde_json::from_str(&metrics.header_value()).unwrap();

        assert_eq!(value["last_request_metrics"]["request_id"], "req_1");
        assert_eq!(value["last_request_metrics"]["request_duration_ms"], 42);
    }

    #[test]
    fn metrics_are_attached_once() {
        let telemetry = Telemetry::new(true);
        telemetry.record(Some("req_1"), Duration::from_millis(15));

        let mut first = request();
        telemetry.attach(&mut first);
        let mut second = request();
        telemetry.attach(&mut second);

        assert!(first.header(headers::CLIENT_TELEMETRY).is_some());
        assert!(second.header(headers::CLIENT_TELEMETRY).is_none());
    }

    #[test]
    fn newer_metrics_replace_older() {
        let telemetry = Telemetry::new(true);
        telemetry.record(Some("req_1"), Duration::from_millis(1));
        telemetry.record(Some("req_2"), Duration::from_millis(2));

        assert_eq!(telemetry.take().unwrap().request_id, "req_2");
    }

    #[test]
    fn disabled_cell_records_nothing() {
        let telemetry = Telemetry::new(false);
        telemetry.record(Some("req_1"), Duration::from_millis(1));

        let mut req = request();
        telemetry.attach(&mut req);

        assert!(req.header(headers::CLIENT_TELEMETRY).is_none());
    }

    #[test]
    fn missing_request_id_is_not_recorded() {
        let telemetry = Telemetry::new(true);
        telemetry.record(None, Duration::from_millis(1));

        assert!(telemetry.take().is_none());
    }
}
