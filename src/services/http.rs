//! Retriable HTTP client shared by every service.
//!
//! One method performs the whole request → retry → decode → select
//! sequence. The circuit breaker and the image-host header quirks live
//! inside this one client object, which is built once at startup and
//! passed around in an `Arc`; nothing here is a process global.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::services::breaker::CircuitBreaker;

/// Browser-like UA; the API rejects obvious bot agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosts that refuse image downloads without a browser Accept header.
const IMAGE_ACCEPT_HOSTS: [&str; 2] = ["imgur", "loli"];

/// A decoded response body, keyed by content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    /// `application/json` bodies, parsed.
    Json(Value),
    /// `text/*` bodies.
    Text(String),
    /// Everything else, raw.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Payload {
    /// Unwrap into JSON or fail with a decode error.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(_) => Err(AppError::decode("expected JSON payload, got text")),
            Self::Bytes(_) => Err(AppError::decode("expected JSON payload, got bytes")),
        }
    }
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// One step of a selector path.
#[derive(Debug, Clone, Copy)]
pub enum Token {
    /// Object key lookup.
    Key(&'static str),
    /// Array index lookup.
    Index(usize),
}

/// Projects the interesting part out of a decoded payload.
pub enum Selector {
    /// Descend into parsed JSON key by key.
    Path(&'static [Token]),
    /// Derive a value from the payload with custom logic.
    Map(fn(&Payload) -> Result<Value>),
}

impl Selector {
    /// Apply the selector. Missing values fail with a selector-miss
    /// error, shape mismatches with a selector-type error; both carry
    /// the path walked so far.
    pub fn apply(&self, payload: &Payload) -> Result<Value> {
        match self {
            Self::Map(f) => f(payload),
            Self::Path(tokens) => {
                let Payload::Json(root) = payload else {
                    return Err(AppError::selector_type("$"));
                };
                let mut current = root;
                let mut trail = String::from("$");
                for token in *tokens {
                    match token {
                        Token::Key(key) => {
                            trail.push('.');
                            trail.push_str(key);
                            match current {
                                Value::Object(map) => {
                                    current = map
                                        .get(*key)
                                        .ok_or_else(|| AppError::selector_miss(&trail))?;
                                }
                                _ => return Err(AppError::selector_type(&trail)),
                            }
                        }
                        Token::Index(index) => {
                            trail.push_str(&format!("[{index}]"));
                            match current {
                                Value::Array(items) => {
                                    current = items
                                        .get(*index)
                                        .ok_or_else(|| AppError::selector_miss(&trail))?;
                                }
                                _ => return Err(AppError::selector_type(&trail)),
                            }
                        }
                    }
                }
                Ok(current.clone())
            }
        }
    }
}

/// Retry behaviour for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per request. Default: 3
    pub retries: u32,
    /// First backoff delay. Default: 1s
    pub base_delay: Duration,
    /// Backoff ceiling. Default: 10s
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given 1-based attempt: base doubled per attempt,
    /// capped at the ceiling.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// A raw response after status checking, before decoding.
struct RawResponse {
    content_type: Option<String>,
    final_url: Url,
    body: Vec<u8>,
}

/// HTTP client with retries, breaker and payload decoding.
pub struct RequestClient {
    http: Client,
    breaker: CircuitBreaker,
    policy: RetryPolicy,
    cookie: Option<HeaderValue>,
}

impl RequestClient {
    /// Create a client carrying the session cookie, with an optional
    /// `user:pass@host:port` proxy.
    pub fn new(cookie: &str, max_failures: u32, proxy: Option<&str>) -> Result<Self> {
        Self::with_policy(cookie, CircuitBreaker::new(max_failures), RetryPolicy::default(), proxy)
    }

    /// Create a client with explicit breaker and retry settings.
    pub fn with_policy(
        cookie: &str,
        breaker: CircuitBreaker,
        policy: RetryPolicy,
        proxy: Option<&str>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url(proxy))?);
        }
        let http = builder.build()?;

        let cookie = if cookie.is_empty() {
            None
        } else {
            Some(
                HeaderValue::from_str(cookie)
                    .map_err(|e| AppError::config(format!("invalid session cookie: {e}")))?,
            )
        };

        Ok(Self {
            http,
            breaker,
            policy,
            cookie,
        })
    }

    /// Perform a request and decode the response, optionally projecting
    /// it through a selector.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
        selector: Option<&Selector>,
    ) -> Result<Payload> {
        let raw = self.send_with_retries(&method, url, &headers, body).await?;
        let payload = decode(raw)?;
        match selector {
            Some(selector) => Ok(Payload::Json(selector.apply(&payload)?)),
            None => Ok(payload),
        }
    }

    /// Fetch a resource as raw bytes, reporting the final URL after
    /// redirects. Used by the image pipeline, which derives the file
    /// extension from that final URL.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Url)> {
        let raw = self
            .send_with_retries(&Method::GET, url, &HeaderMap::new(), None)
            .await?;
        Ok((raw.body, raw.final_url))
    }

    async fn send_with_retries(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let max_attempts = self.policy.retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.breaker.check()?;

            match self.dispatch(method, url, headers, body).await {
                Ok(raw) => {
                    self.breaker.record_success();
                    return Ok(raw);
                }
                Err(err) => {
                    if !err.is_not_found() {
                        self.breaker.record_failure();
                    }
                    if !err.is_retriable() || attempt >= max_attempts {
                        return Err(err);
                    }
                    let delay = self.policy.delay_after(attempt);
                    log::warn!(
                        "request to {url} failed (attempt {attempt}/{max_attempts}): {err}; retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(self.headers_for(url, headers));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(AppError::status(status.as_u16(), final_url));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_lowercase());
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            content_type,
            final_url,
            body,
        })
    }

    /// Per-host header fixups: the session cookie goes to the API host
    /// only, and picky image CDNs get a browser Accept header.
    fn headers_for(&self, url: &str, extra: &HeaderMap) -> HeaderMap {
        let mut headers = extra.clone();
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return headers;
        };

        if host == "leetcode.com" || host.ends_with(".leetcode.com") {
            if let Some(cookie) = &self.cookie {
                if !headers.contains_key(COOKIE) {
                    headers.insert(COOKIE, cookie.clone());
                }
            }
        }

        if IMAGE_ACCEPT_HOSTS.iter().any(|quirk| host.contains(quirk))
            && !headers.contains_key(ACCEPT)
        {
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("image/avif,image/webp,image/*,*/*;q=0.8"),
            );
        }

        headers
    }
}

fn decode(raw: RawResponse) -> Result<Payload> {
    let content_type = raw.content_type.as_deref().unwrap_or("");
    if content_type.contains("application/json") || content_type.contains("+json") {
        Ok(Payload::Json(serde_json::from_slice(&raw.body)?))
    } else if content_type.starts_with("text/") {
        Ok(Payload::Text(
            String::from_utf8_lossy(&raw.body).into_owned(),
        ))
    } else {
        Ok(Payload::Bytes(raw.body))
    }
}

fn proxy_url(spec: &str) -> String {
    if spec.contains("://") {
        spec.to_string()
    } else {
        format!("http://{spec}")
    }
}
