use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url, Version};

use crate::{RequestError, Result};

/// Status line and headers of a response whose body was drained into memory.
#[derive(Clone, Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub url: Url,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub(crate) fn of(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            version: response.version(),
            url: response.url().clone(),
            headers: response.headers().clone(),
        }
    }
}

/// Result of one logical call.
///
/// Response, body and error are independent channels: an HTTP error status
/// populates all three, so callers can inspect the payload of a failed call.
#[derive(Debug)]
#[must_use]
pub struct Exchange {
    pub response: Option<ResponseHead>,
    pub body: Option<Bytes>,
    pub error: Option<RequestError>,
    /// Physical attempts that reached the transport.
    pub attempts: u32,
}

impl Exchange {
    pub(crate) fn rejected(error: RequestError) -> Self {
        Self {
            response: None,
            body: None,
            error: Some(error),
            attempts: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|head| head.status)
    }

    /// Body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }

    /// Collapses the exchange into a plain `Result`, dropping the response
    /// of failed calls.
    pub fn into_result(self) -> Result<(ResponseHead, Bytes)> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self.response {
            Some(head) => Ok((head, self.body.unwrap_or_default())),
            None => Err(RequestError::Exhausted {
                attempts: self.attempts,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use reqwest::{StatusCode, Version};

    use super::{Exchange, ResponseHead};
    use crate::RequestError;

    fn head(status: StatusCode) -> ResponseHead {
        ResponseHead {
            status,
            version: Version::HTTP_11,
            url: "http://localhost/".parse().expect("valid url"),
            headers: Default::default(),
        }
    }

    #[test]
    fn status_error_keeps_response_and_body() {
        let exchange = Exchange {
            response: Some(head(StatusCode::BAD_REQUEST)),
            body: Some(Bytes::from_static(b"bad input")),
            error: Some(RequestError::Status {
                status: StatusCode::BAD_REQUEST,
                body: "bad input".to_owned(),
            }),
            attempts: 1,
        };
        assert!(!exchange.is_success());
        assert_eq!(exchange.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(exchange.text().as_deref(), Some("bad input"));

        let err = exchange.into_result().expect_err("status error");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn success_into_result() {
        let exchange = Exchange {
            response: Some(head(StatusCode::OK)),
            body: Some(Bytes::from_static(b"ok")),
            error: None,
            attempts: 1,
        };
        let (head, body) = exchange.into_result().expect("success");
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }

    #[test]
    fn rejected_has_no_attempts() {
        let exchange = Exchange::rejected(RequestError::EmptyUrl);
        assert_eq!(exchange.attempts, 0);
        assert!(exchange.response.is_none());
        assert!(matches!(exchange.error, Some(RequestError::EmptyUrl)));
    }
}
