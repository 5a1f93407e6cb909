use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use tokio_util::sync::CancellationToken;

use crate::{
    encode::{encode_body, Body, BodyFormat, EncodedBody},
    headers::{apply_headers, is_unset, Headers},
    retry::{is_idempotent_method, is_retryable_error, is_retryable_status, sleep_backoff},
    Exchange, HttpClient, RequestError, ResponseHead, Result, RetryOptions, DEFAULT_TIMEOUT,
    ERROR_BODY_LIMIT,
};

/// Describes one logical HTTP call.
///
/// The descriptor is never modified by [`Request::perform`], so it can be
/// reused and shared between tasks.
#[derive(Clone, Debug)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub format: BodyFormat,
    /// Retries transport timeouts and transient statuses for idempotent methods.
    pub retry: bool,
    /// Injected client (custom transport, proxy, ...). Never mutated; a timeout
    /// override works on a shallow copy.
    pub client: Option<HttpClient>,
    pub retry_options: RetryOptions,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            format: BodyFormat::default(),
            retry: false,
            client: None,
            retry_options: RetryOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET.as_str(), url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST.as_str(), url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT.as_str(), url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE.as_str(), url)
    }

    pub fn with_format(mut self, format: BodyFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_retry_options(mut self, opts: RetryOptions) -> Self {
        self.retry_options = opts;
        self
    }

    /// Executes the call.
    ///
    /// - `cancel`: aborts between attempts, during backoff and while waiting on
    ///   the network
    /// - `headers`: applied to every attempt
    /// - `body`: encoded once according to [`Request::format`] and replayed on
    ///   every attempt
    /// - `timeout`: per-attempt timeout override, defaults to
    ///   [`DEFAULT_TIMEOUT`] when absent or zero
    ///
    /// A status of 400 or above is reported as [`RequestError::Status`] while
    /// the response and body stay populated.
    pub async fn perform(
        &self,
        cancel: &CancellationToken,
        headers: &Headers,
        body: Body<'_>,
        timeout: Option<Duration>,
    ) -> Exchange {
        if self.url.trim().is_empty() {
            return Exchange::rejected(RequestError::EmptyUrl);
        }
        if self.method.trim().is_empty() {
            return Exchange::rejected(RequestError::EmptyMethod);
        }

        let timeout = timeout.filter(|timeout| !timeout.is_zero());
        let client = match (&self.client, timeout) {
            (None, timeout) => Cow::Owned(HttpClient::new(timeout.unwrap_or(DEFAULT_TIMEOUT))),
            (Some(client), None) => Cow::Borrowed(client),
            (Some(client), Some(timeout)) => Cow::Owned(client.with_timeout(timeout)),
        };

        let encoded = match encode_body(self.format, &body) {
            Ok(encoded) => encoded,
            Err(err) => return Exchange::rejected(err.into()),
        };

        let budget = if self.retry && is_idempotent_method(&self.method) {
            self.retry_options.attempt_budget()
        } else {
            1
        };

        let mut last = LastOutcome::default();

        for attempt in 1..=budget {
            if cancel.is_cancelled() {
                return last.finish(attempt - 1, RequestError::Cancelled);
            }

            let request = match self.build_request(headers, encoded.as_ref()) {
                Ok(request) => request,
                Err(err) => {
                    return Exchange {
                        attempts: attempt - 1,
                        ..Exchange::rejected(err)
                    }
                }
            };
            let can_retry = self.retry && attempt < budget;

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                sent = client.send(request) => Some(sent),
            };
            let response = match sent {
                None => return last.finish(attempt, RequestError::Cancelled),
                Some(Ok(response)) => response,
                Some(Err(err)) => {
                    if can_retry && is_retryable_error(&err) {
                        self.back_off(cancel, attempt, "transport error").await;
                        continue;
                    }
                    return last.finish(attempt, RequestError::Do(err));
                }
            };

            let head = ResponseHead::of(&response);
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                read = response.bytes() => Some(read),
            };
            let payload = match read {
                None => {
                    last.record(head, None);
                    return last.finish(attempt, RequestError::Cancelled);
                }
                Some(Ok(payload)) => payload,
                Some(Err(err)) => {
                    last.record(head, None);
                    if can_retry {
                        self.back_off(cancel, attempt, "body read error").await;
                        continue;
                    }
                    return last.finish(attempt, RequestError::ReadResponse(err.into()));
                }
            };

            let status = head.status;
            last.record(head, Some(payload));

            if can_retry && is_retryable_status(status) {
                self.back_off(cancel, attempt, "retryable status").await;
                continue;
            }

            return last.settle(attempt);
        }

        last.exhausted(budget)
    }

    fn build_request(
        &self,
        headers: &Headers,
        encoded: Option<&EncodedBody>,
    ) -> Result<reqwest::Request> {
        let method = Method::from_bytes(self.method.trim().as_bytes()).map_err(|err| {
            RequestError::create_request(format!("invalid method {:?}", self.method), err)
        })?;
        let url = Url::parse(self.url.trim()).map_err(|err| {
            RequestError::create_request(format!("invalid url {:?}", self.url), err)
        })?;

        let mut request = reqwest::Request::new(method, url);
        apply_headers(request.headers_mut(), headers)?;

        if let Some(encoded) = encoded {
            if is_unset(request.headers(), &CONTENT_TYPE) {
                request
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(encoded.content_type));
            }
            *request.body_mut() = Some(encoded.payload.clone().into());
        }

        if is_unset(request.headers(), &ACCEPT) {
            request
                .headers_mut()
                .insert(ACCEPT, HeaderValue::from_static(self.format.accept()));
        }

        Ok(request)
    }

    async fn back_off(&self, cancel: &CancellationToken, attempt: u32, reason: &str) {
        let delay = self.retry_options.backoff.delay(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %self.method,
            url = %self.url,
            attempt,
            ?delay,
            "retrying request after {reason}"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = reason;

        sleep_backoff(cancel, delay).await;
    }
}

/// Response and body of the most recent attempt that got a response.
#[derive(Default)]
struct LastOutcome {
    response: Option<ResponseHead>,
    body: Option<Bytes>,
}

impl LastOutcome {
    fn record(&mut self, response: ResponseHead, body: Option<Bytes>) {
        self.response = Some(response);
        self.body = body;
    }

    fn finish(self, attempts: u32, error: RequestError) -> Exchange {
        #[cfg(feature = "tracing")]
        {
            if error.is_cancelled() {
                tracing::debug!(attempts, "request cancelled");
            }
        }

        Exchange {
            response: self.response,
            body: self.body,
            error: Some(error),
            attempts,
        }
    }

    fn settle(self, attempts: u32) -> Exchange {
        let error = match (&self.response, &self.body) {
            (Some(head), body) => status_error(head.status, body.as_deref().unwrap_or_default()),
            (None, _) => None,
        };
        Exchange {
            response: self.response,
            body: self.body,
            error,
            attempts,
        }
    }

    fn exhausted(self, attempts: u32) -> Exchange {
        let failed_status = self
            .response
            .as_ref()
            .is_some_and(|head| head.status.as_u16() >= 400);
        if failed_status {
            self.settle(attempts)
        } else {
            self.finish(attempts, RequestError::Exhausted { attempts })
        }
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> Option<RequestError> {
    (status.as_u16() >= 400).then(|| RequestError::Status {
        status,
        body: truncate(&String::from_utf8_lossy(body), ERROR_BODY_LIMIT),
    })
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_owned(),
    }
}
