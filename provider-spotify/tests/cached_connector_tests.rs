//! Connector behaviour behind the request cache

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playlist::PlaylistStore;
use bytes::Bytes;
use core_auth::{AccessToken, SessionContext, StaticCredentials};
use provider_spotify::{CachedHttpClient, SpotifyConnector};

/// Serves canned bodies by path and counts round trips per method
#[derive(Default)]
struct CountingServer {
    gets: AtomicUsize,
    writes: AtomicUsize,
}

#[async_trait]
impl HttpClient for CountingServer {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let (status, body) = if request.method == HttpMethod::Get {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if request.url.ends_with("/images") {
                (200, "[]")
            } else {
                (
                    200,
                    r#"{"items": [{"track": {"id": "t1", "uri": "spotify:track:t1",
                        "name": "One", "duration_ms": 1000, "artists": []}}], "next": null}"#,
                )
            }
        } else {
            self.writes.fetch_add(1, Ordering::SeqCst);
            (201, r#"{"snapshot_id": "s"}"#)
        };

        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        })
    }
}

async fn connector(server: Arc<CountingServer>) -> (SpotifyConnector, Arc<CachedHttpClient>) {
    let cache = Arc::new(CachedHttpClient::new(
        server,
        NonZeroUsize::new(16).unwrap(),
    ));
    let session = SessionContext::new(Arc::new(StaticCredentials::new(AccessToken::new("t"))));
    session.start().await.unwrap();
    let connector = SpotifyConnector::new(cache.clone(), Arc::new(session))
        .with_base_url("http://localhost:8080/v1/");
    (connector, cache)
}

#[tokio::test]
async fn repeated_reads_hit_the_network_once() {
    let server = Arc::new(CountingServer::default());
    let (connector, _) = connector(server.clone()).await;

    for _ in 0..3 {
        let tracks = connector.get_tracks("source").await.unwrap();
        assert_eq!(tracks.len(), 1);
    }
    assert_eq!(server.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn writes_invalidate_cached_reads() {
    let server = Arc::new(CountingServer::default());
    let (connector, cache) = connector(server.clone()).await;

    connector.get_tracks("target").await.unwrap();
    connector
        .add_tracks("target", &["spotify:track:t2".to_string()])
        .await
        .unwrap();
    assert_eq!(cache.len().await, 0);

    connector.get_tracks("target").await.unwrap();
    assert_eq!(server.gets.load(Ordering::SeqCst), 2);
    assert_eq!(server.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cover_polling_is_never_cached() {
    let server = Arc::new(CountingServer::default());
    let (connector, cache) = connector(server.clone()).await;

    for _ in 0..4 {
        assert!(connector.get_cover_image("p1").await.unwrap().is_none());
    }
    assert_eq!(server.gets.load(Ordering::SeqCst), 4);
    assert_eq!(cache.len().await, 0);
}
