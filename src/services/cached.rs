//! Cached facade over the retriable client.
//!
//! Every API operation goes through here: look the key up in the disk
//! cache, otherwise perform the request and store the decoded payload.
//! When the upstream is unavailable (circuit open, transport failure
//! after retries) the facade degrades to a missing value so assemblers
//! can skip the affected section instead of aborting; failures are
//! never cached.

use std::sync::Arc;

use chrono::Duration;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::Result;
use crate::services::http::{Payload, RequestClient, Selector};
use crate::storage::DiskCache;

/// Build a cache key by joining parts with `-`.
pub fn cache_key(parts: &[&str]) -> String {
    parts.join("-")
}

/// Get-or-fetch layer pairing the HTTP client with the disk cache.
pub struct CachedClient {
    client: Arc<RequestClient>,
    cache: Option<DiskCache>,
    ttl: Duration,
}

impl CachedClient {
    /// Create a facade. `cache` is `None` when response caching is
    /// disabled; the nil-mapping still applies.
    pub fn new(client: Arc<RequestClient>, cache: Option<DiskCache>, ttl_days: u32) -> Self {
        Self {
            client,
            cache,
            ttl: Duration::days(i64::from(ttl_days)),
        }
    }

    /// The underlying client, for raw downloads that bypass the cache.
    pub fn client(&self) -> &Arc<RequestClient> {
        &self.client
    }

    /// Cached request. `Ok(None)` means the value is unavailable right
    /// now; other failures propagate.
    pub async fn request(
        &self,
        key: &str,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
        selector: Option<&Selector>,
    ) -> Result<Option<Payload>> {
        if let Some(hit) = self.lookup(key).await? {
            return Ok(Some(hit));
        }

        match self.client.request(method, url, headers, body, selector).await {
            Ok(payload) => {
                self.store(key, &payload).await?;
                Ok(Some(payload))
            }
            Err(err) if err.is_unavailable() => {
                log::warn!("'{key}' unavailable: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Cached GET trying each candidate URL in turn; the first success
    /// is stored under the one shared key. Used for assets published
    /// under more than one file-name casing: any failure moves on to
    /// the next candidate, and `Ok(None)` means none of them resolved.
    pub async fn request_first(
        &self,
        key: &str,
        candidates: &[String],
        selector: Option<&Selector>,
    ) -> Result<Option<Payload>> {
        if let Some(hit) = self.lookup(key).await? {
            return Ok(Some(hit));
        }

        for url in candidates {
            match self
                .client
                .request(Method::GET, url, HeaderMap::new(), None, selector)
                .await
            {
                Ok(payload) => {
                    self.store(key, &payload).await?;
                    return Ok(Some(payload));
                }
                Err(err) => {
                    log::warn!("candidate {url} for '{key}' failed: {err}");
                }
            }
        }
        Ok(None)
    }

    async fn lookup(&self, key: &str) -> Result<Option<Payload>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let hit = cache.get::<Payload>(key).await?;
        if hit.is_some() {
            log::debug!("cache hit for '{key}'");
        }
        Ok(hit)
    }

    async fn store(&self, key: &str, payload: &Payload) -> Result<()> {
        if let Some(cache) = &self.cache {
            cache.set(key, payload, self.ttl).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::breaker::CircuitBreaker;
    use crate::services::http::RetryPolicy;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    fn client(retries: u32, threshold: u32) -> Arc<RequestClient> {
        Arc::new(
            RequestClient::with_policy(
                "",
                CircuitBreaker::new(threshold),
                RetryPolicy {
                    retries,
                    base_delay: StdDuration::from_millis(1),
                    max_delay: StdDuration::from_millis(5),
                },
                None,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_cache_key_joins_with_hyphen() {
        assert_eq!(cache_key(&["question", "two-sum"]), "question-two-sum");
        assert_eq!(cache_key(&["1", "slide", "abc"]), "1-slide-abc");
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/q")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":1}"#)
            .expect(1)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let cached = CachedClient::new(client(3, 10), Some(DiskCache::new(tmp.path())), 7);
        let url = format!("{}/q", server.url());

        let first = cached
            .request("question-1", Method::GET, &url, HeaderMap::new(), None, None)
            .await
            .unwrap();
        let second = cached
            .request("question-1", Method::GET, &url, HeaderMap::new(), None, None)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, Some(Payload::Json(serde_json::json!({"id": 1}))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_disabled_cache_is_passthrough() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/q")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let cached = CachedClient::new(client(3, 10), None, 7);
        let url = format!("{}/q", server.url());
        for _ in 0..2 {
            cached
                .request("k", Method::GET, &url, HeaderMap::new(), None, None)
                .await
                .unwrap();
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_none() {
        let tmp = TempDir::new().unwrap();
        let cached = CachedClient::new(client(1, 10), Some(DiskCache::new(tmp.path())), 7);

        // nothing listens on port 9; connection is refused
        let result = cached
            .request(
                "k",
                Method::GET,
                "http://127.0.0.1:9/x",
                HeaderMap::new(),
                None,
                None,
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_circuit_open_maps_to_none_and_failures_are_not_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/down")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let cached = CachedClient::new(client(1, 1), Some(DiskCache::new(tmp.path())), 7);
        let url = format!("{}/down", server.url());

        // First call reaches the wire once and propagates the status.
        let err = cached
            .request("k", Method::GET, &url, HeaderMap::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Status { code: 500, .. }));

        // Second call short-circuits on the open breaker: nil, no wire.
        let second = cached
            .request("k", Method::GET, &url, HeaderMap::new(), None, None)
            .await
            .unwrap();
        assert!(second.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_first_falls_back_and_shares_key() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/a.json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let found = server
            .mock("GET", "/b.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"timeline":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let tmp = TempDir::new().unwrap();
        let cached = CachedClient::new(client(1, 10), Some(DiskCache::new(tmp.path())), 7);
        let candidates = vec![
            format!("{}/a.json", server.url()),
            format!("{}/b.json", server.url()),
        ];

        let first = cached
            .request_first("1-slide-h", &candidates, None)
            .await
            .unwrap();
        assert!(first.is_some());

        // Cached now; neither candidate is fetched again.
        let second = cached
            .request_first("1-slide-h", &candidates, None)
            .await
            .unwrap();
        assert_eq!(first, second);

        missing.assert_async().await;
        found.assert_async().await;
    }
}
