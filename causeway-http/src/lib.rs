//! Minimal HTTP client with safe logging, retries, and flexible auth.
//!
//! - Per-request options: timeout, retry budget, extra headers, [`Auth`]
//! - Retries 429/5xx and transport failures with exponential backoff and
//!   `Retry-After` support; callers that must observe every failure pass
//!   `retries: Some(0)`
//! - Structured `tracing` events for request start, response, retries, and
//!   final errors; Authorization values never appear in logs
//!
//! ```rust
//! # async fn demo() -> Result<(), causeway_http::HttpError> {
//! let client = causeway_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", causeway_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const BODY_SNIPPET_MAX: usize = 500;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Authentication strategies supported by the client.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>` (token is sanitized first).
    Bearer(&'a str),
    /// HTTP Basic credentials; reqwest handles the base64 encoding.
    Basic { user: &'a str, pass: &'a str },
    None,
}

/// Per-request tuning knobs.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    /// Override the default per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget.
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET a JSON resource. `path` may carry a literal query string; it is
    /// resolved against the client's base URL.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, None, opts).await
    }

    /// POST a pre-encoded `application/x-www-form-urlencoded` body and decode
    /// the JSON reply.
    pub async fn post_form<T>(
        &self,
        path: &str,
        form: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(form.to_owned()), opts)
            .await
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        form_body: Option<String>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut attempt = 0usize;

        loop {
            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);

            if let Some(body) = &form_body {
                rb = rb
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(body.clone());
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            let auth_kind = match &opts.auth {
                Some(Auth::Bearer(token)) => {
                    let token = sanitize_bearer(token)?;
                    rb = rb.bearer_auth(token);
                    "bearer"
                }
                Some(Auth::Basic { user, pass }) => {
                    rb = rb.basic_auth(user, Some(pass));
                    "basic"
                }
                Some(Auth::None) | None => "none",
            };

            tracing::debug!(
                attempt = attempt + 1,
                max_retries,
                method = %method,
                host_path = %host_path(&url),
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                has_body = form_body.is_some(),
                "http.request"
            );

            let started = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            error = %err,
                            "http.retry.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(HttpError::Network(err.to_string()));
                }
            };

            let status = resp.status();
            let headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            error = %err,
                            "http.retry.body"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(HttpError::Network(err.to_string()));
                }
            };

            tracing::debug!(
                %status,
                duration_ms = started.elapsed().as_millis() as u64,
                body_len = bytes.len(),
                "http.response"
            );

            let snippet = snip_body(&bytes);

            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        serde_err = %e,
                        body_snippet = %snippet,
                        "http.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = extract_error_message(&bytes);
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < max_retries {
                attempt += 1;
                let delay = retry_after_secs(&headers)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| backoff(attempt));
                tracing::warn!(
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    message = %message,
                    "http.retry.status"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                %status,
                message = %message,
                body_snippet = %snippet,
                "http.error"
            );
            return Err(HttpError::Api { status, message });
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt.saturating_sub(1))))
}

fn host_path(url: &Url) -> String {
    format!("{}{}", url.domain().unwrap_or("-"), url.path())
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > BODY_SNIPPET_MAX {
        snip.truncate(BODY_SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

/// Pull a human-readable message out of an error body.
///
/// Understands the Twitter v1.1 envelope (`{"errors":[{"code":..,
/// "message":".."}]}`) and the common single-field shapes, falling back to a
/// body snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct TwitterErrors {
        errors: Vec<TwitterError>,
    }
    #[derive(Deserialize)]
    struct TwitterError {
        #[serde(default)]
        message: String,
    }

    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        error: String,
        #[serde(default)]
        error_description: String,
        #[serde(default)]
        message: String,
    }

    if let Ok(envelope) = serde_json::from_slice::<TwitterErrors>(body) {
        if let Some(first) = envelope.errors.into_iter().find(|e| !e.message.is_empty()) {
            return first.message;
        }
    }
    if let Ok(flat) = serde_json::from_slice::<Flat>(body) {
        if !flat.error_description.is_empty() {
            return flat.error_description;
        }
        if !flat.message.is_empty() {
            return flat.message;
        }
        if !flat.error.is_empty() {
            return flat.error;
        }
    }
    snip_body(body)
}

/// Strip whitespace and quotes from a bearer token and reject values that
/// could not form a valid Authorization header.
fn sanitize_bearer(raw: &str) -> Result<String, HttpError> {
    let mut token = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    token.retain(|ch| !ch.is_ascii_whitespace());

    if !token.is_ascii() {
        return Err(HttpError::Build("bearer token contains non-ASCII bytes".into()));
    }
    if token.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "bearer token contains control characters".into(),
        ));
    }
    Ok(token)
}
