//! Request cache
//!
//! Memoizes successful GET responses so a discovery run that reads the same
//! source playlist for several managed playlists fetches it once.
//!
//! Any non-GET request passes through and empties the cache, so reads after a
//! write always hit the network. Requests carrying `Cache-Control: no-cache`
//! bypass the cache entirely; the connector uses that for endpoints it polls.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::trace;

pub const CACHE_CONTROL: &str = "Cache-Control";
pub const NO_CACHE: &str = "no-cache";

/// `HttpClient` decorator with an LRU response cache
pub struct CachedHttpClient {
    inner: Arc<dyn HttpClient>,
    cache: Mutex<LruCache<String, HttpResponse>>,
}

impl CachedHttpClient {
    /// Wrap `inner`, keeping at most `capacity` responses
    pub fn new(inner: Arc<dyn HttpClient>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Drop every cached response
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    fn cache_key(request: &HttpRequest) -> Option<String> {
        let bypass = request
            .headers
            .get(CACHE_CONTROL)
            .is_some_and(|value| value == NO_CACHE);
        (request.method == HttpMethod::Get && !bypass)
            .then(|| format!("{} {}", request.method, request.url))
    }
}

#[async_trait]
impl HttpClient for CachedHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let Some(key) = Self::cache_key(&request) else {
            if request.method != HttpMethod::Get {
                self.clear().await;
            }
            return self.inner.execute(request).await;
        };

        if let Some(response) = self.cache.lock().await.get(&key) {
            trace!(key = %key, "Request cache hit");
            return Ok(response.clone());
        }

        let response = self.inner.execute(request).await?;
        if response.is_success() {
            self.cache.lock().await.put(key, response.clone());
        }
        Ok(response)
    }

    async fn is_connected(&self) -> bool {
        self.inner.is_connected().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn ok(body: &'static str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body),
        }
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_get_is_memoized() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(ok("{}")));

        let client = CachedHttpClient::new(Arc::new(mock_http), capacity(4));
        let request = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/a");

        client.execute(request.clone()).await.unwrap();
        let second = client.execute(request).await.unwrap();
        assert_eq!(second.body, Bytes::from("{}"));
        assert_eq!(client.len().await, 1);
    }

    #[tokio::test]
    async fn test_write_clears_cache() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Ok(ok("{}")));

        let client = CachedHttpClient::new(Arc::new(mock_http), capacity(4));
        let read = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/a/tracks");

        client.execute(read.clone()).await.unwrap();
        client
            .execute(HttpRequest::new(
                HttpMethod::Put,
                "https://api.spotify.com/v1/playlists/a/tracks",
            ))
            .await
            .unwrap();
        assert_eq!(client.len().await, 0);

        client.execute(read).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_cache_and_failures_are_not_stored() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(4).returning(|request| {
            if request.url.ends_with("/missing") {
                Ok(HttpResponse {
                    status: 404,
                    headers: HashMap::new(),
                    body: Bytes::new(),
                })
            } else {
                Ok(ok("[]"))
            }
        });

        let client = CachedHttpClient::new(Arc::new(mock_http), capacity(4));
        let polled = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/a/images")
            .header(CACHE_CONTROL, NO_CACHE);
        let missing = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/missing");

        client.execute(polled.clone()).await.unwrap();
        client.execute(polled).await.unwrap();
        client.execute(missing.clone()).await.unwrap();
        client.execute(missing).await.unwrap();
        assert_eq!(client.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(3)
            .returning(|_| Ok(ok("{}")));

        let client = CachedHttpClient::new(Arc::new(mock_http), capacity(1));
        let a = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/a");
        let b = HttpRequest::new(HttpMethod::Get, "https://api.spotify.com/v1/playlists/b");

        client.execute(a.clone()).await.unwrap();
        client.execute(b).await.unwrap();
        client.execute(a).await.unwrap();
        assert_eq!(client.len().await, 1);
    }
}
