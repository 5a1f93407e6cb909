//! `retryable-http` executes single HTTP calls over `reqwest` with body
//! encoding, header mapping and an optional retry strategy.
//!
//! The entry point is [`Request::perform`]:
//! - bodies are encoded once as JSON, XML or plain text ([`BodyFormat`])
//! - idempotent methods retry transport timeouts and transient statuses
//!   (429, 500, 502, 503, 504) with exponential backoff
//! - the result is an [`Exchange`] that keeps the response and body even when
//!   the status is an error

use std::time::Duration;

mod encode;
mod error;
mod headers;
mod options;
mod request;
pub mod retry;
mod transport;
mod types;

pub use encode::{
    encode_body, Body, BodyFormat, EncodedBody, StructuredBody, XML_TEXT_ROOT,
};
pub use error::{EncodeError, RequestError};
pub use headers::{HeaderArg, Headers};
pub use options::RetryOptions;
pub use request::Request;
pub use retry::{BackoffSchedule, ExponentialBackoff};
pub use transport::{
    HttpClient, NetError, NetSignals, ReqwestTransport, Transport, TransportError,
};
pub use types::{Exchange, ResponseHead};

pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, RequestError>;

/// Per-attempt timeout used when no override is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Attempt budget for idempotent requests with retries enabled.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
/// First retry delay; doubles on every further attempt.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);
/// Characters of the response body quoted in status errors.
pub const ERROR_BODY_LIMIT: usize = 800;
