//! Spotify Web API connector implementation
//!
//! Implements the `PlaylistStore` trait over the Spotify Web API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::playlist::{
    Artist, CoverImage, Playlist, PlaylistStore, Track, User, Visibility, MAX_TRACKS_PER_REQUEST,
};
use bytes::Bytes;
use core_auth::SessionContext;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CACHE_CONTROL, NO_CACHE};
use crate::error::SpotifyError;
use crate::types::{
    cover_of, ArtistsResponse, CreatePlaylistRequest, ImageObject, Paging, PlaylistObject,
    PlaylistTrackObject, TrackUrisRequest, UserObject,
};

/// Spotify Web API base URL
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Maximum ids accepted by the several-artists endpoint
pub const MAX_ARTISTS_PER_REQUEST: usize = 50;

/// Maximum page size of playlist and track listings
const PAGE_LIMIT: u32 = 50;

/// Spotify Web API connector
///
/// Implements `PlaylistStore` for the Spotify Web API.
///
/// # Features
///
/// - Paginated listings following the `next` URL
/// - Chunked track additions
/// - Base64 JPEG cover uploads
/// - Bearer tokens drawn from a [`SessionContext`] per request
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::playlist::PlaylistStore;
///
/// let connector = SpotifyConnector::new(http_client, session);
/// let playlists = connector.list_playlists().await?;
/// ```
pub struct SpotifyConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Session supplying access tokens
    session: Arc<SessionContext>,

    base_url: String,
    timeout: Duration,
}

impl SpotifyConnector {
    /// Create a connector against the public API
    pub fn new(http_client: Arc<dyn HttpClient>, session: Arc<SessionContext>) -> Self {
        Self {
            http_client,
            session,
            base_url: SPOTIFY_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the connector at another API root, e.g. a local mock server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Build an authorized request
    async fn request(
        &self,
        method: HttpMethod,
        url: String,
    ) -> std::result::Result<HttpRequest, SpotifyError> {
        let token = self.session.access_token().await?;
        Ok(HttpRequest::new(method, url)
            .bearer_token(token.secret())
            .header("Accept", "application/json")
            .timeout(self.timeout))
    }

    /// Execute a request and check its status
    async fn send(
        &self,
        request: HttpRequest,
        expected: &[u16],
        endpoint: &str,
    ) -> std::result::Result<HttpResponse, SpotifyError> {
        let method = request.method;
        let response = self.http_client.execute(request).await?;

        if expected.contains(&response.status) {
            debug!(%method, endpoint, status = response.status, "API request succeeded");
            return Ok(response);
        }

        warn!(%method, endpoint, status = response.status, "API request failed");
        Err(SpotifyError::ApiError {
            endpoint: endpoint.to_string(),
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).to_string(),
        })
    }

    fn parse<T: DeserializeOwned>(
        response: &HttpResponse,
        endpoint: &str,
    ) -> std::result::Result<T, SpotifyError> {
        serde_json::from_slice(&response.body).map_err(|e| {
            SpotifyError::ParseError(format!("Failed to parse {} response: {}", endpoint, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        endpoint: &str,
    ) -> std::result::Result<T, SpotifyError> {
        let request = self.request(HttpMethod::Get, url).await?;
        let response = self.send(request, &[200], endpoint).await?;
        Self::parse(&response, endpoint)
    }

    /// Collect every item of a paged listing
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        first_page: String,
        endpoint: &str,
    ) -> std::result::Result<Vec<T>, SpotifyError> {
        let mut items = Vec::new();
        let mut next = Some(first_page);

        while let Some(url) = next {
            let page: Paging<T> = self.get_json(url, endpoint).await?;
            items.extend(page.items);
            next = page.next;
        }
        Ok(items)
    }

    async fn send_uris(
        &self,
        method: HttpMethod,
        playlist_id: &str,
        uris: &[String],
        expected: &[u16],
    ) -> std::result::Result<(), SpotifyError> {
        let endpoint = format!("playlists/{}/tracks", encode(playlist_id));
        let request = self
            .request(method, self.url(&endpoint))
            .await?
            .json(&TrackUrisRequest { uris })?;
        self.send(request, expected, &endpoint).await?;
        Ok(())
    }

    async fn append_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> std::result::Result<(), SpotifyError> {
        for chunk in uris.chunks(MAX_TRACKS_PER_REQUEST) {
            self.send_uris(HttpMethod::Post, playlist_id, chunk, &[201])
                .await?;
        }
        Ok(())
    }
}

fn encode(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

#[async_trait]
impl PlaylistStore for SpotifyConnector {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User> {
        let request = self
            .request(HttpMethod::Get, self.url("me"))
            .await?
            .header(CACHE_CONTROL, NO_CACHE);
        // Accounts not admitted to the application get 403 here
        let response = match self.send(request, &[200], "me").await {
            Err(SpotifyError::ApiError {
                status_code: 403, ..
            }) => return Err(SpotifyError::NoAccess.into()),
            other => other?,
        };
        let user: UserObject = Self::parse(&response, "me")?;
        Ok(user.into())
    }

    #[instrument(skip(self, description), fields(name = %name))]
    async fn create_playlist(
        &self,
        name: &str,
        visibility: Visibility,
        description: &str,
    ) -> Result<Playlist> {
        let user = self.current_user().await?;
        let endpoint = format!("users/{}/playlists", encode(&user.id));

        let request = self
            .request(HttpMethod::Post, self.url(&endpoint))
            .await?
            .json(&CreatePlaylistRequest {
                name,
                public: visibility.is_public(),
                description,
            })?;
        let response = self.send(request, &[201], &endpoint).await?;
        let created: PlaylistObject = Self::parse(&response, &endpoint)?;

        info!(playlist_id = %created.id, "Created playlist");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        let endpoint = format!("playlists/{}", encode(playlist_id));
        let playlist: PlaylistObject = self.get_json(self.url(&endpoint), &endpoint).await?;
        Ok(playlist.into())
    }

    #[instrument(skip(self))]
    async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let first = self.url(&format!("me/playlists?limit={}", PAGE_LIMIT));
        let playlists: Vec<PlaylistObject> = self.get_all_pages(first, "me/playlists").await?;

        info!("Listed {} playlists", playlists.len());
        Ok(playlists.into_iter().map(Playlist::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let endpoint = format!("playlists/{}/tracks", encode(playlist_id));
        let first = self.url(&format!("{}?limit={}", endpoint, PAGE_LIMIT * 2));
        let items: Vec<PlaylistTrackObject> = self.get_all_pages(first, &endpoint).await?;

        let tracks: Vec<Track> = items
            .into_iter()
            .filter_map(|item| item.track)
            .map(Track::from)
            .collect();
        debug!(count = tracks.len(), "Fetched tracks");
        Ok(tracks)
    }

    #[instrument(skip(self, uris), fields(count = uris.len()))]
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        Ok(self.append_tracks(playlist_id, uris).await?)
    }

    #[instrument(skip(self, uris), fields(count = uris.len()))]
    async fn replace_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        self.send_uris(HttpMethod::Put, playlist_id, &[], &[200, 201])
            .await?;
        Ok(self.append_tracks(playlist_id, uris).await?)
    }

    #[instrument(skip(self, jpeg_base64), fields(size = jpeg_base64.len()))]
    async fn set_cover_image(&self, playlist_id: &str, jpeg_base64: &str) -> Result<()> {
        let endpoint = format!("playlists/{}/images", encode(playlist_id));
        let request = self
            .request(HttpMethod::Put, self.url(&endpoint))
            .await?
            .body_with_type(Bytes::from(jpeg_base64.to_owned()), "image/jpeg");
        self.send(request, &[202], &endpoint).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_cover_image(&self, playlist_id: &str) -> Result<Option<CoverImage>> {
        let endpoint = format!("playlists/{}/images", encode(playlist_id));
        let request = self
            .request(HttpMethod::Get, self.url(&endpoint))
            .await?
            .header(CACHE_CONTROL, NO_CACHE);
        let response = self.send(request, &[200], &endpoint).await?;
        let images: Option<Vec<ImageObject>> = Self::parse(&response, &endpoint)?;
        Ok(cover_of(images))
    }

    #[instrument(skip(self, artist_ids), fields(count = artist_ids.len()))]
    async fn get_artists(&self, artist_ids: &[String]) -> Result<Vec<Artist>> {
        let mut artists = Vec::with_capacity(artist_ids.len());
        for chunk in artist_ids.chunks(MAX_ARTISTS_PER_REQUEST) {
            let ids = chunk
                .iter()
                .map(|id| encode(id).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            let response: ArtistsResponse = self
                .get_json(self.url(&format!("artists?ids={}", ids)), "artists")
                .await?;
            artists.extend(response.artists.into_iter().flatten().map(Artist::from));
        }
        Ok(artists)
    }

    #[instrument(skip(self))]
    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<()> {
        let endpoint = format!("playlists/{}/followers", encode(playlist_id));
        let request = self.request(HttpMethod::Delete, self.url(&endpoint)).await?;
        self.send(request, &[200], &endpoint).await?;
        info!("Unfollowed playlist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use core_auth::{AccessToken, StaticCredentials};
    use mockall::{mock, Sequence};
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    async fn connector(mock_http: MockHttpClient) -> SpotifyConnector {
        let session = SessionContext::new(Arc::new(StaticCredentials::new(AccessToken::new(
            "test_token",
        ))));
        session.start().await.unwrap();
        SpotifyConnector::new(Arc::new(mock_http), Arc::new(session))
    }

    #[tokio::test]
    async fn test_current_user() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://api.spotify.com/v1/me");
            assert_eq!(
                req.headers.get("Authorization"),
                Some(&"Bearer test_token".to_string())
            );
            response(200, r#"{"id": "wizzler", "display_name": "Wizzler"}"#)
        });

        let user = connector(mock_http).await.current_user().await.unwrap();
        assert_eq!(user.id, "wizzler");
        assert_eq!(user.display_name.as_deref(), Some("Wizzler"));
    }

    #[tokio::test]
    async fn test_current_user_forbidden_is_no_access() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(403, "User not registered in the Developer Dashboard"));

        let error = connector(mock_http).await.current_user().await.unwrap_err();
        assert!(matches!(error, BridgeError::NoAccess(_)));
    }

    #[tokio::test]
    async fn test_invalidated_session_makes_no_requests() {
        let mock_http = MockHttpClient::new();
        let connector = connector(mock_http).await;
        connector.session.invalidate("logout").await;

        let error = connector.list_playlists().await.unwrap_err();
        assert!(error.is_auth_failure());
    }

    #[tokio::test]
    async fn test_create_playlist() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| response(200, r#"{"id": "wizzler"}"#));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Post);
                assert_eq!(req.url, "https://api.spotify.com/v1/users/wizzler/playlists");
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                assert_eq!(
                    body,
                    serde_json::json!({"name": "Road Trip", "public": false, "description": ""})
                );
                response(
                    201,
                    r#"{"id": "new1", "name": "Road Trip", "description": "", "images": [],
                        "external_urls": {"spotify": "https://open.spotify.com/playlist/new1"}}"#,
                )
            });

        let playlist = connector(mock_http)
            .await
            .create_playlist("Road Trip", Visibility::Private, "")
            .await
            .unwrap();
        assert_eq!(playlist.id, "new1");
        assert!(playlist.cover.is_none());
    }

    #[tokio::test]
    async fn test_list_playlists_follows_next() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.contains("offset=50") {
                response(200, r#"{"items": [{"id": "b", "name": "B", "images": null}], "next": null}"#)
            } else {
                assert_eq!(req.url, "https://api.spotify.com/v1/me/playlists?limit=50");
                response(
                    200,
                    r#"{"items": [{"id": "a", "name": "A", "images": []}],
                        "next": "https://api.spotify.com/v1/me/playlists?offset=50&limit=50"}"#,
                )
            }
        });

        let playlists = connector(mock_http).await.list_playlists().await.unwrap();
        let ids: Vec<_> = playlists.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_get_tracks_skips_unavailable_items() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            response(
                200,
                r#"{"items": [
                    {"track": {"id": "t1", "uri": "spotify:track:t1", "name": "One",
                               "duration_ms": 1000, "album": {"release_date": "2001"},
                               "artists": [{"id": "a1"}]}},
                    {"track": null}
                ], "next": null}"#,
            )
        });

        let tracks = connector(mock_http).await.get_tracks("p1").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri, "spotify:track:t1");
        assert_eq!(tracks[0].release_year, Some(2001));
    }

    #[tokio::test]
    async fn test_add_tracks_chunks_at_100() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        for expected in [100usize, 100, 50] {
            mock_http
                .expect_execute()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |req| {
                    let body: serde_json::Value =
                        serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                    assert_eq!(body["uris"].as_array().unwrap().len(), expected);
                    response(201, r#"{"snapshot_id": "s"}"#)
                });
        }

        let uris: Vec<String> = (0..250).map(|i| format!("spotify:track:{i}")).collect();
        connector(mock_http)
            .await
            .add_tracks("p1", &uris)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_tracks_clears_then_adds() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = Sequence::new();
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Put);
                assert_eq!(req.body.as_deref(), Some(&br#"{"uris":[]}"#[..]));
                response(200, r#"{"snapshot_id": "s"}"#)
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|req| {
                assert_eq!(req.method, HttpMethod::Post);
                response(201, r#"{"snapshot_id": "s"}"#)
            });

        connector(mock_http)
            .await
            .replace_tracks("p1", &["spotify:track:a".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_with_empty_list_only_clears() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(201, r#"{"snapshot_id": "s"}"#));

        connector(mock_http)
            .await
            .replace_tracks("p1", &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_cover_image() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Put);
            assert_eq!(req.url, "https://api.spotify.com/v1/playlists/p1/images");
            assert_eq!(
                req.headers.get("Content-Type"),
                Some(&"image/jpeg".to_string())
            );
            assert_eq!(req.body.as_deref(), Some(&b"/9j/4AAQ"[..]));
            response(202, "")
        });

        connector(mock_http)
            .await
            .set_cover_image("p1", "/9j/4AAQ")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_cover_image_unexpected_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(200, ""));

        let error = connector(mock_http)
            .await
            .set_cover_image("p1", "/9j/")
            .await
            .unwrap_err();
        assert!(matches!(error, BridgeError::Status { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_get_cover_image_returns_last() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            assert_eq!(req.headers.get(CACHE_CONTROL), Some(&NO_CACHE.to_string()));
            if req.url.contains("/empty/") {
                response(200, "[]")
            } else {
                response(
                    200,
                    r#"[{"url": "https://i.scdn.co/640", "width": 640, "height": 640},
                        {"url": "https://mosaic.scdn.co/up", "width": null, "height": null}]"#,
                )
            }
        });

        let connector = connector(mock_http).await;
        let cover = connector.get_cover_image("p1").await.unwrap().unwrap();
        assert_eq!(cover.url, "https://mosaic.scdn.co/up");
        assert!(cover.is_dimensionless());
        assert!(connector.get_cover_image("empty").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_artists_batches_by_50() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            let ids = req.url.split("ids=").nth(1).unwrap();
            assert!(ids.split(',').count() <= MAX_ARTISTS_PER_REQUEST);
            response(
                200,
                r#"{"artists": [{"id": "a1", "name": "One"}, null]}"#,
            )
        });

        let ids: Vec<String> = (0..60).map(|i| format!("artist{i}")).collect();
        let artists = connector(mock_http).await.get_artists(&ids).await.unwrap();
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name, "One");
    }

    #[tokio::test]
    async fn test_unfollow_playlist() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Delete);
            assert_eq!(req.url, "https://api.spotify.com/v1/playlists/p1/followers");
            response(200, "")
        });

        connector(mock_http)
            .await
            .unfollow_playlist("p1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_handling() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(404, "Not found"));

        let result = connector(mock_http).await.get_playlist("nonexistent").await;
        assert!(matches!(
            result,
            Err(BridgeError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| response(401, "The access token expired"));

        let error = connector(mock_http).await.get_tracks("p1").await.unwrap_err();
        assert!(matches!(error, BridgeError::Unauthenticated(_)));
    }
}
