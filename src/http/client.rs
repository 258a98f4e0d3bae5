//! Request configuration and the send engine.

use futures_util::FutureExt;
use log::debug;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use super::body::{Body, Payload, SerializedBody};
use super::data::Data;
use super::error::HttpError;
use super::response::Response;
use super::retry::{DEFAULT_RETRIES, DEFAULT_TIMEOUT, ReCheck, default_recheck, with_retry};

/// Everything needed to send one logical request, including its retry policy.
///
/// Fields are public so callers can adjust them between [`Client::new`] and
/// [`Client::send`].
pub struct Client {
    pub url: String,
    pub method: String,
    pub query_params: Data,
    pub headers: Data,
    pub body: Body,
    /// Per-attempt network deadline.
    pub timeout: Duration,
    /// Additional attempts after the first.
    pub retry: u32,
    /// Whether a successful response is final; `false` asks for a retry.
    pub recheck: ReCheck,
    http: reqwest::Client,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("query_params", &self.query_params)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with a 10 second timeout, no retries and a retry
    /// check that accepts every response.
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            query_params: Data::new(),
            headers: Data::new(),
            body: Body::default(),
            timeout: DEFAULT_TIMEOUT,
            retry: DEFAULT_RETRIES,
            recheck: default_recheck(),
            http: reqwest::Client::new(),
        }
    }

    /// Sends through `http` instead of a client of our own.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_recheck<F>(mut self, recheck: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.recheck = std::sync::Arc::new(recheck);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key, value);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Deep copy: the maps and body are duplicated, the retry check and the
    /// underlying connection pool are shared.
    pub fn copy(&self) -> Self {
        Self {
            url: self.url.clone(),
            method: self.method.clone(),
            query_params: self.query_params.copy(),
            headers: self.headers.copy(),
            body: self.body.copy(),
            timeout: self.timeout,
            retry: self.retry,
            recheck: self.recheck.clone(),
            http: self.http.clone(),
        }
    }

    /// The URL with query parameters appended, unescaped.
    pub fn query_url(&self) -> String {
        if self.query_params.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query_params.link())
        }
    }

    /// Sends the request, retrying with exponential backoff.
    ///
    /// Every attempt works on its own [`copy`](Self::copy) of this client.
    /// Transport failures and responses rejected by [`recheck`](Self::recheck)
    /// are retried while attempts remain; other errors are returned at once.
    /// The outcome of the last attempt is returned.
    #[tracing::instrument(skip(self), fields(method = %self.method, url = %self.url))]
    pub async fn send(&self) -> Result<Response, HttpError> {
        let operation_name = format!("{} {}", self.method, self.url);
        let recheck = self.recheck.clone();

        with_retry(
            &operation_name,
            self.retry,
            |response: &Response| recheck(response),
            || async move {
                let attempt = self.copy();
                attempt.send_once().await
            },
        )
        .await
    }

    /// A single attempt without retry.
    pub async fn send_once(&self) -> Result<Response, HttpError> {
        let method = Method::from_bytes(self.method.as_bytes()).map_err(|_| {
            HttpError::Construction(format!("invalid HTTP method {:?}", self.method))
        })?;

        let url = self.query_url();
        let parsed_url = reqwest::Url::parse(&url)
            .map_err(|e| HttpError::Construction(format!("invalid URL {:?}: {}", url, e)))?;

        let body = self.body.serialize();
        let content_type = self.effective_content_type(&body);

        let mut request = self
            .http
            .request(method, parsed_url)
            .timeout(self.timeout);

        for (key, value) in &self.headers {
            if key.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            request = request.header(key.as_str(), value.as_str());
        }
        request = match body.payload {
            // Sets its own Content-Type with the same boundary.
            Payload::Multipart(form) => request.multipart(form),
            Payload::Bytes(bytes) => {
                if !content_type.is_empty() {
                    request = request.header(CONTENT_TYPE, content_type.as_str());
                }
                if bytes.is_empty() {
                    request
                } else {
                    request.body(bytes)
                }
            }
        };

        let request = request
            .build()
            .map_err(|e| HttpError::Construction(e.to_string()))?;

        debug!("{} {}...", request.method(), request.url());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| {
                // reqwest only rejects unsupported URL schemes once executing.
                if e.is_builder() {
                    HttpError::Construction(e.to_string())
                } else {
                    HttpError::Transport(e)
                }
            })?;

        AssertUnwindSafe(Response::from_reqwest(response, content_type))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_to_error(payload)))
    }

    /// Form bodies dictate their content type. Raw bodies keep whatever the
    /// caller put in the headers, if anything.
    fn effective_content_type(&self, body: &SerializedBody) -> String {
        if !body.content_type.is_empty() {
            return body.content_type.clone();
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }
}

fn panic_to_error(payload: Box<dyn Any + Send>) -> HttpError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    HttpError::Panicked(message)
}
