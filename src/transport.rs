use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;

/// Errors that report whether they are timeouts or temporary conditions.
///
/// Only errors with this capability are ever considered for a retry.
pub trait NetError: StdError + Send + Sync + 'static {
    fn is_timeout(&self) -> bool;
    fn is_temporary(&self) -> bool;
}

impl NetError for reqwest::Error {
    fn is_timeout(&self) -> bool {
        reqwest::Error::is_timeout(self)
    }

    // Connection setup failures (refused, reset, DNS) are the transient class.
    fn is_temporary(&self) -> bool {
        reqwest::Error::is_connect(self)
    }
}

/// Timeout/temporary signals captured from a [`NetError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NetSignals {
    pub timeout: bool,
    pub temporary: bool,
}

/// Failure reported by a [`Transport`] while sending or reading a response.
#[derive(Debug)]
pub struct TransportError {
    inner: Box<dyn StdError + Send + Sync>,
    signals: Option<NetSignals>,
}

impl TransportError {
    /// Wraps an error that exposes timeout/temporary signals.
    pub fn net<E: NetError>(err: E) -> Self {
        let signals = NetSignals {
            timeout: err.is_timeout(),
            temporary: err.is_temporary(),
        };
        Self {
            inner: Box::new(err),
            signals: Some(signals),
        }
    }

    /// Wraps an error without classification signals. Never retried.
    pub fn other(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            inner: err.into(),
            signals: None,
        }
    }

    pub fn signals(&self) -> Option<NetSignals> {
        self.signals
    }

    pub fn is_timeout(&self) -> bool {
        self.signals.is_some_and(|signals| signals.timeout)
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::net(err)
    }
}

/// Sends one physical request and hands back the response head plus body stream.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, TransportError>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, TransportError> {
        self.client.execute(request).await.map_err(TransportError::from)
    }
}

// Clients built on demand share one connection pool.
fn shared_reqwest() -> reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new).clone()
}

#[derive(Clone)]
/// Transport plus the per-request timeout applied to everything it sends.
///
/// Cloning is shallow: clones share the transport, and
/// [`HttpClient::with_timeout`] returns a new value instead of touching `self`,
/// so one client can serve concurrent calls with different timeouts.
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &"<dyn Transport>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClient {
    /// Creates a client over the process-wide `reqwest` pool.
    pub fn new(timeout: Duration) -> Self {
        Self::from_reqwest(shared_reqwest(), timeout)
    }

    /// Creates a client over a caller-configured `reqwest::Client`
    /// (proxy, TLS roots, default headers, ...).
    pub fn from_reqwest(client: reqwest::Client, timeout: Duration) -> Self {
        Self::with_transport(ReqwestTransport::new(client), timeout)
    }

    pub fn with_transport(transport: impl Transport + 'static, timeout: Duration) -> Self {
        Self::from_shared(Arc::new(transport), timeout)
    }

    pub fn from_shared(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shallow copy sharing the transport but carrying a different timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            timeout,
        }
    }

    /// Sends `request` with this client's timeout attached.
    pub async fn send(
        &self,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Response, TransportError> {
        *request.timeout_mut() = Some(self.timeout);
        self.transport.send(request).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TIMEOUT)
    }
}
