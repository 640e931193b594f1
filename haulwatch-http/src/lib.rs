//! Minimal HTTP client with safe logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Redacts sensitive query params and Telegram-style `/bot<token>/` path
//!   segments; never logs secret values
//! - Retries 429/5xx with exponential backoff and `Retry-After` support
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), haulwatch_http::HttpError> {
//! let client = haulwatch_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", haulwatch_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! retries, response headers, and final errors (targets `http.*`). Only the
//! auth kind (bearer/header/query/none) is ever logged, not the secret.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

// ==============================
// Errors
// ==============================

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

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param
    Query { name: &'a str, value: Cow<'a, str> },
    None,
}

/// Per-request tuning knobs for the HTTP client.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use haulwatch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
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

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget returned by [`HttpClient::new`].
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST JSON with per-request options (headers/query/auth/timeout/retries).
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json_internal(Method::POST, path, Some(body), opts)
            .await
    }

    async fn request_json_internal<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        mut opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let safe_target = redact_url_for_log(&url);

        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);

        loop {
            // ----- Build request -----
            let mut rb = self.inner.request(method.clone(), url.clone());

            let timeout = opts.timeout.unwrap_or(self.default_timeout);
            rb = rb.timeout(timeout);

            if let Some(q) = &opts.query {
                let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                rb = rb.query(&pairs);
            }

            if let Some(b) = body {
                rb = rb.json(b);
            }

            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            if let Some(auth) = &opts.auth {
                match auth {
                    Auth::Bearer(tok) => {
                        let tok = sanitize_api_key(tok)?;
                        rb = rb.bearer_auth(tok);
                    }
                    Auth::Header { name, value } => {
                        rb = rb.header(name, value);
                    }
                    Auth::Query { name, value } => {
                        let mut q = opts.query.take().unwrap_or_default();
                        q.push((*name, value.clone()));
                        let pairs: Vec<(&str, &str)> =
                            q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                        rb = rb.query(&pairs);
                        opts.query = Some(q); // persist for retries
                    }
                    Auth::None => {}
                }
            }

            // ----- Safe request logging (pre-send) -----
            let auth_kind = match &opts.auth {
                Some(Auth::Bearer(_)) => "bearer",
                Some(Auth::Header { .. }) => "header",
                Some(Auth::Query { .. }) => "query",
                Some(Auth::None) | None => "none",
            };
            let redacted_q: Vec<(String, String)> = opts
                .query
                .as_ref()
                .map(|q| {
                    q.iter()
                        .map(|(k, v)| {
                            (
                                (*k).to_string(),
                                if is_secret_param(k) {
                                    "<redacted>".to_string()
                                } else {
                                    v.as_ref().to_string()
                                },
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();

            tracing::debug!(
                attempt = attempt + 1,
                max_retries,
                method = %method,
                host_path = %safe_target,
                query = ?redacted_q,
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                has_body = %body.is_some(),
                "http.request.start"
            );

            // ----- Send -----
            let t0 = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff_delay(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            message = %message,
                            "http.retrying.network_send"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(HttpError::Network(message));
                }
            };
            let status = resp.status();
            let headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff_delay(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            message = %message,
                            "http.retrying.network_body"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            tracing::debug!(
                %status,
                duration_ms = dur_ms,
                body_len = bytes.len(),
                "http.response.headers"
            );

            let snippet = snip_body(&bytes);
            tracing::trace!(body_snippet = %snippet, "http.response.body_snippet");

            // ----- Success path -----
            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        serde_err = %e.to_string(),
                        body_snippet = %snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            // ----- Non-success: maybe retry -----
            let message = extract_error_message(&bytes);

            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            let is_5xx = status.is_server_error();

            if (is_429 || is_5xx) && attempt < max_retries {
                attempt += 1;
                let delay = if let Some(secs) = retry_after_delay_secs(&headers) {
                    Duration::from_secs(secs)
                } else {
                    let exp = backoff_delay(attempt);
                    if is_429 {
                        // default floor for 429 when no Retry-After is present
                        exp.max(Duration::from_millis(1100))
                    } else {
                        exp
                    }
                };
                tracing::warn!(
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    message = %message,
                    "http.retrying"
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

// ==============================
// Helpers
// ==============================

fn backoff_delay(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt - 1).min(8)))
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

/// "host + path" string for logging, with Telegram-style `/bot<token>/`
/// segments collapsed so the bot token never reaches the logs.
fn redact_url_for_log(url: &Url) -> String {
    let host_path = format!("{}{}", url.domain().unwrap_or("-"), url.path());
    redact_bot_path(&host_path)
}

fn redact_bot_path(host_path: &str) -> String {
    let Some(start) = host_path.find("/bot") else {
        return host_path.to_string();
    };
    let token_start = start + "/bot".len();
    let token_end = host_path[token_start..]
        .find('/')
        .map(|i| token_start + i)
        .unwrap_or(host_path.len());
    format!(
        "{}/bot<redacted>{}",
        &host_path[..start],
        &host_path[token_end..]
    )
}

fn extract_error_message(body: &[u8]) -> String {
    // Telegram style: {"ok":false,"description":"..."}
    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(serde::Deserialize)]
    struct Msg {
        #[serde(default)]
        description: String,
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.description.is_empty() {
            return m.description;
        }
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(500);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    // 3) Ensure ASCII and no control chars
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // 4) Validate header value upfront for clear errors
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_token_path_is_redacted() {
        assert_eq!(
            redact_bot_path("api.telegram.org/bot123456:AAdeadbeef/sendMessage"),
            "api.telegram.org/bot<redacted>/sendMessage"
        );
        assert_eq!(
            redact_bot_path("api.telegram.org/bot123456:AAdeadbeef"),
            "api.telegram.org/bot<redacted>"
        );
        assert_eq!(
            redact_bot_path("files.ati.su/glossary/cargoTypes.json"),
            "files.ati.su/glossary/cargoTypes.json"
        );
    }

    #[test]
    fn secret_query_params_are_flagged() {
        assert!(is_secret_param("token"));
        assert!(is_secret_param("API_KEY"));
        assert!(!is_secret_param("offset"));
    }

    #[test]
    fn sanitize_strips_whitespace_and_quotes() {
        assert_eq!(sanitize_api_key(" \"abc def\" ").unwrap(), "abcdef");
        assert!(sanitize_api_key("bad\u{7f}key").is_err());
    }

    #[test]
    fn error_message_prefers_telegram_description() {
        let body = br#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        assert_eq!(
            extract_error_message(body),
            "Bad Request: chat not found".to_string()
        );
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn long_bodies_are_snipped() {
        let body = vec![b'x'; 600];
        let snip = snip_body(&body);
        assert!(snip.ends_with("..."));
        assert_eq!(snip.len(), 503);
    }
}
