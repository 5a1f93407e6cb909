use reqwest::StatusCode;

use crate::transport::TransportError;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The descriptor has a blank URL; nothing was sent.
    #[error("URL is empty")]
    EmptyUrl,
    /// The descriptor has a blank method; nothing was sent.
    #[error("Method is empty")]
    EmptyMethod,
    /// The body could not be encoded; nothing was sent.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The physical request could not be built (bad method, URL or header).
    #[error("create request: {context}: {source}")]
    CreateRequest {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The transport failed before a response was received.
    #[error("do request: {0}")]
    Do(#[source] TransportError),
    /// A response arrived but its body could not be read.
    #[error("read response: {0}")]
    ReadResponse(#[source] TransportError),
    /// Non-success HTTP status with a truncated rendering of the body.
    #[error("http error {}: {body}", status.as_u16())]
    Status { status: StatusCode, body: String },
    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
    /// Every attempt in the budget was used without a final outcome.
    #[error("request failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl RequestError {
    pub(crate) fn create_request(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::CreateRequest {
            context: context.into(),
            source: source.into(),
        }
    }

    /// HTTP status carried by a [`RequestError::Status`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when the error came from the caller's cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Body encoding failure.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// `serde_json` could not serialize the value.
    #[error("json marshal: {0}")]
    Json(#[source] serde_json::Error),
    /// `quick-xml` could not serialize the value, or it has no element name.
    #[error("xml marshal: {0}")]
    Xml(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Plain bodies accept only text or raw bytes.
    #[error("plain body expects text or bytes, got a structured value")]
    PlainBody,
}
