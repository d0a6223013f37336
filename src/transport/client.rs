//! Production transport implementation using reqwest.

use std::path::Path;
use std::time::Duration;

use super::{Connector, HttpRequest, HttpResponse, Transport, TransportError};
use crate::config::ClientConfig;

/// Settings applied to every reqwest handle opened by [`ReqwestConnector`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Timeout for establishing the TCP/TLS connection.
    pub open_timeout: Duration,
    /// Timeout between reads of the response.
    pub read_timeout: Duration,
    /// Optional proxy URL for all traffic.
    pub proxy: Option<url::Url>,
    /// Whether server certificates are verified.
    pub verify_ssl_certs: bool,
    /// PEM-encoded trust bundle added to the built-in roots.
    pub ca_bundle: Option<Vec<u8>>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            open_timeout: crate::config::defaults::open_timeout(),
            read_timeout: crate::config::defaults::read_timeout(),
            proxy: None,
            verify_ssl_certs: true,
            ca_bundle: None,
        }
    }
}

impl TransportSettings {
    /// Extracts transport settings from a client configuration.
    ///
    /// Reads the CA bundle from disk if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the trust bundle cannot be read.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let ca_bundle = config
            .ca_bundle_path
            .as_deref()
            .map(read_ca_bundle)
            .transpose()?;

        Ok(Self {
            open_timeout: config.open_timeout,
            read_timeout: config.read_timeout,
            proxy: config.proxy.clone(),
            verify_ssl_certs: config.verify_ssl_certs,
            ca_bundle,
        })
    }
}

fn read_ca_bundle(path: &Path) -> Result<Vec<u8>, TransportError> {
    std::fs::read(path).map_err(|e| {
        TransportError::Configuration(format!(
            "failed to read CA bundle '{}': {e}",
            path.display()
        ))
    })
}

/// Opens reqwest-backed connection handles.
///
/// Each handle wraps its own `reqwest::Client` limited to a single idle
/// socket, so evicting a handle from the pool really closes its connection
/// instead of leaving it in a shared reqwest pool.
///
/// # Example
///
/// ```no_run
/// use stripe_core::transport::{Connector, HttpRequest, ReqwestConnector, Transport};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = ReqwestConnector::default();
/// let transport = connector.connect("https://api.stripe.com:443").await?;
/// let request = HttpRequest::get(Url::parse("https://api.stripe.com/v1/balance")?);
/// let response = transport.send(request).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReqwestConnector {
    settings: TransportSettings,
}

impl ReqwestConnector {
    /// Creates a connector with the given settings.
    #[must_use]
    pub const fn new(settings: TransportSettings) -> Self {
        Self { settings }
    }

    /// Returns the settings applied to new handles.
    #[must_use]
    pub const fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        let settings = &self.settings;
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.open_timeout)
            .read_timeout(settings.read_timeout)
            .pool_max_idle_per_host(1)
            .danger_accept_invalid_certs(!settings.verify_ssl_certs);

        if let Some(proxy) = &settings.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| TransportError::Configuration(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if let Some(pem) = &settings.ca_bundle {
            let certs = reqwest::Certificate::from_pem_bundle(pem)
                .map_err(|e| TransportError::Configuration(format!("invalid CA bundle: {e}")))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))
    }
}

impl Connector for ReqwestConnector {
    type Transport = ReqwestTransport;

    async fn connect(&self, host: &str) -> Result<ReqwestTransport, TransportError> {
        tracing::debug!("Opening connection handle for {host}");
        Ok(ReqwestTransport {
            inner: self.build_client()?,
        })
    }
}

/// A reqwest-backed connection handle.
///
/// This is a thin wrapper around `reqwest::Client` that implements
/// the [`Transport`] trait.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a handle from an existing reqwest client.
    ///
    /// Useful when you need configuration not covered by [`TransportSettings`].
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.inner.request(req.method, req.url.as_str());

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(classify_reqwest_error)?
            .to_vec();

        Ok(HttpResponse::new(status, headers, body))
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidUrl(e.to_string())
    } else {
        TransportError::Connection(Box::new(e))
    }
}
