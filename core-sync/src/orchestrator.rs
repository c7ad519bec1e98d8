//! # Synchronization Orchestrator
//!
//! Creates, discovers and re-synchronizes managed playlists.
//!
//! ## Overview
//!
//! The `SyncOrchestrator` is the only component that talks to the remote
//! store on behalf of the synchronization engine. It coordinates:
//! - Encoding the definition and embedding it into the cover comment
//! - Uploading the cover with unbounded fixed-delay retry
//! - Fetching source tracks concurrently and resolving the target set
//! - Polling until the uploaded cover becomes visible
//! - Emitting progress events via `EventBus`
//!
//! ## Workflow
//!
//! ### Create
//! 1. Encode the definition and embed it in the cover bytes
//! 2. Create the empty playlist shell
//! 3. Upload the cover, retrying every failure after a fixed delay
//! 4. Fetch source tracks, resolve, and append them
//! 5. Poll for a dimensionless cover; give up softly as `Unconverged`
//!
//! ### Discovery
//! 1. List every followed playlist
//! 2. Classify each one concurrently by reading its cover comment
//! 3. Resolve referenced playlists and artists for the managed ones
//!
//! ### Update / Synchronize
//! The cover is uploaded before any track is written, so a failed upload
//! leaves the playlist as it was. Tracks are replaced wholesale, so repeating an operation converges on the
//! same state. The cover is re-uploaded when new cover bytes are supplied or
//! the published definition differs from the wanted one.
//!
//! The remote store is eventually consistent and offers no multi-field
//! transactions; a single writer per playlist is assumed.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::HttpClient;
use bridge_traits::playlist::{Artist, CoverImage, Playlist, PlaylistStore, Track, Visibility};
use bridge_traits::time::Sleeper;
use core_cover::{generate, marker, transport};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use futures::future::{join_all, try_join_all};
use tracing::{debug, info, instrument, warn};

use crate::definition::{self, Definition, RangeLimits};
use crate::error::{Result, SyncError};
use crate::resolver::{self, Filters};
use crate::retry::{poll_until, retry_with, RetryPolicy};
use crate::state::{build_definition, ManagedPlaylist, SyncState};

/// Edge length of covers synthesized when the caller supplies none
pub const DEFAULT_COVER_SIZE: u32 = 300;

/// Retry and polling settings of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Policy for cover uploads; unbounded by default
    pub cover_upload: RetryPolicy,

    /// How many times to look for the uploaded cover
    pub cover_poll_attempts: u32,

    /// Wait between cover lookups
    pub cover_poll_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cover_upload: RetryPolicy::unbounded(Duration::from_millis(500)),
            cover_poll_attempts: 5,
            cover_poll_delay: Duration::from_millis(500),
        }
    }
}

impl From<&CoreConfig> for SyncConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            cover_upload: RetryPolicy {
                delay: config.cover_retry_delay,
                max_attempts: config.cover_retry_max_attempts,
            },
            cover_poll_attempts: config.cover_poll_attempts,
            cover_poll_delay: config.cover_poll_delay,
        }
    }
}

/// Everything needed to create a managed playlist
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    /// Baseline JPEG to carry the definition; a plain cover is generated
    /// when `None`
    pub cover: Option<Vec<u8>>,
    pub included: Vec<Playlist>,
    pub excluded: Vec<Playlist>,
    pub required: Vec<Playlist>,
    pub required_artists: Vec<Artist>,
    pub duration_limits: RangeLimits<u64>,
    pub release_year_limits: RangeLimits<i32>,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>, included: Vec<Playlist>) -> Self {
        Self {
            name: name.into(),
            included,
            ..Self::default()
        }
    }

    /// The definition the new playlist will carry
    pub fn definition(&self) -> Definition {
        build_definition(
            &self.included,
            &self.excluded,
            &self.required,
            &self.required_artists,
            self.duration_limits,
            self.release_year_limits,
        )
    }

    /// Upload body for the cover, with the definition embedded
    fn cover_payload(&self) -> Result<String> {
        let definition = self.definition();
        match &self.cover {
            Some(cover) => embed_definition(cover, &definition),
            None => embed_definition(&default_cover(&self.name)?, &definition),
        }
    }
}

/// Changes to apply to a managed playlist; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Replacement cover bytes; the published cover is reused when `None`
    pub cover: Option<Vec<u8>>,
    pub included: Option<Vec<Playlist>>,
    pub excluded: Option<Vec<Playlist>>,
    pub required: Option<Vec<Playlist>>,
    pub required_artists: Option<Vec<Artist>>,
    pub duration_limits: Option<RangeLimits<u64>>,
    pub release_year_limits: Option<RangeLimits<i32>>,
}

impl UpdateRequest {
    fn apply(self, managed: &mut ManagedPlaylist) -> Option<Vec<u8>> {
        if let Some(included) = self.included {
            managed.included = included;
        }
        if let Some(excluded) = self.excluded {
            managed.excluded = excluded;
        }
        if let Some(required) = self.required {
            managed.required = required;
        }
        if let Some(artists) = self.required_artists {
            managed.required_artists = artists;
        }
        if let Some(limits) = self.duration_limits {
            managed.duration_limits = limits;
        }
        if let Some(limits) = self.release_year_limits {
            managed.release_year_limits = limits;
        }
        self.cover
    }
}

/// Synchronization engine over a remote playlist store
pub struct SyncOrchestrator {
    store: Arc<dyn PlaylistStore>,
    http: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    event_bus: EventBus,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn PlaylistStore>,
        http: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
        event_bus: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            http,
            sleeper,
            event_bus,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Create a managed playlist
    ///
    /// Returns the playlist in `SyncState::Unconverged` without a cover when
    /// the uploaded cover did not become visible while polling.
    ///
    /// # Errors
    ///
    /// Fails before any remote write when the definition does not fit the
    /// cover or the cover is not a JPEG. Fails afterwards when the shell
    /// cannot be created, a source cannot be read, or the tracks cannot be
    /// added.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateRequest) -> Result<ManagedPlaylist> {
        let payload = request.cover_payload().map_err(|e| self.fail(None, e))?;

        let playlist = self
            .store
            .create_playlist(&request.name, request.visibility, &request.description)
            .await
            .map_err(|e| self.fail(None, e.into()))?;
        self.emit_started(&playlist.id, "create");

        let mut managed = ManagedPlaylist {
            playlist,
            included: request.included,
            excluded: request.excluded,
            required: request.required,
            required_artists: request.required_artists,
            duration_limits: request.duration_limits,
            release_year_limits: request.release_year_limits,
            state: SyncState::Synchronizing,
        };

        let result = self.create_inner(&mut managed, &payload).await;
        self.finish(managed, result)
    }

    async fn create_inner(&self, managed: &mut ManagedPlaylist, payload: &str) -> Result<usize> {
        self.upload_cover(&managed.playlist.id, payload).await?;

        let tracks = self.resolve_tracks(&managed.definition()).await?;
        self.store
            .add_tracks(&managed.playlist.id, &uris(&tracks))
            .await?;

        self.settle_cover(managed).await;
        Ok(tracks.len())
    }

    /// Re-resolve and replace the tracks of a managed playlist
    ///
    /// The cover is re-uploaded only when its published definition no longer
    /// matches.
    #[instrument(skip(self, managed), fields(playlist_id = %managed.playlist.id))]
    pub async fn synchronize(&self, managed: &ManagedPlaylist) -> Result<ManagedPlaylist> {
        self.emit_started(&managed.playlist.id, "synchronize");
        let mut managed = ManagedPlaylist {
            state: SyncState::Synchronizing,
            ..managed.clone()
        };

        let result = self.synchronize_inner(&mut managed, None).await;
        self.finish(managed, result)
    }

    /// Apply `request` to a managed playlist and re-synchronize it
    #[instrument(skip(self, managed, request), fields(playlist_id = %managed.playlist.id))]
    pub async fn update(
        &self,
        mut managed: ManagedPlaylist,
        request: UpdateRequest,
    ) -> Result<ManagedPlaylist> {
        self.emit_started(&managed.playlist.id, "update");
        let cover = request.apply(&mut managed);
        managed.state = SyncState::Synchronizing;

        let result = self.synchronize_inner(&mut managed, cover).await;
        self.finish(managed, result)
    }

    async fn synchronize_inner(
        &self,
        managed: &mut ManagedPlaylist,
        new_cover: Option<Vec<u8>>,
    ) -> Result<usize> {
        let definition = managed.definition();

        // Cover first: a failed upload must leave the tracks as they were
        let cover = match new_cover {
            Some(cover) => Some(cover),
            None => self.stale_cover(managed, &definition).await?,
        };
        let uploaded = match cover {
            Some(cover) => {
                let payload = embed_definition(&cover, &definition)?;
                self.upload_cover(&managed.playlist.id, &payload).await?;
                true
            }
            None => false,
        };

        let tracks = self.resolve_tracks(&definition).await?;
        self.store
            .replace_tracks(&managed.playlist.id, &uris(&tracks))
            .await?;

        if uploaded {
            self.settle_cover(managed).await;
        } else {
            managed.state = SyncState::Idle;
        }
        Ok(tracks.len())
    }

    /// Published cover bytes, when they carry a definition other than `wanted`
    async fn stale_cover(
        &self,
        managed: &ManagedPlaylist,
        wanted: &Definition,
    ) -> Result<Option<Vec<u8>>> {
        let cover = match self.store.get_cover_image(&managed.playlist.id).await? {
            Some(cover) => cover,
            None => {
                return Err(SyncError::MissingCover {
                    playlist_id: managed.playlist.id.clone(),
                })
            }
        };

        let bytes = transport::fetch_bytes(self.http.as_ref(), &cover.url).await?;
        let published = marker::extract_comment(&bytes)
            .ok()
            .and_then(|comment| definition::decode(comment.as_bytes()).ok());

        if published.as_ref() == Some(wanted) {
            debug!("Published definition is current");
            Ok(None)
        } else {
            Ok(Some(bytes.to_vec()))
        }
    }

    /// Every managed playlist the current user follows
    ///
    /// Classification never fails: playlists whose cover cannot be read or
    /// decoded are simply not managed. Failures resolving the sources of a
    /// managed playlist are returned.
    #[instrument(skip(self))]
    pub async fn list_managed(&self) -> Result<Vec<ManagedPlaylist>> {
        let playlists = self.store.list_playlists().await?;
        let scanned = playlists.len();

        let definitions = join_all(playlists.iter().map(|p| self.classify(p))).await;
        let managed = try_join_all(
            playlists
                .into_iter()
                .zip(definitions)
                .filter_map(|(playlist, definition)| Some((playlist, definition?)))
                .map(|(playlist, definition)| self.rebuild(playlist, definition)),
        )
        .await?;

        info!(scanned, managed = managed.len(), "Managed playlist scan completed");
        self.emit(SyncEvent::DiscoveryCompleted {
            scanned: scanned as u64,
            managed: managed.len() as u64,
        });
        Ok(managed)
    }

    /// Read the definition a playlist's cover carries
    ///
    /// Returns `None` for any playlist that is not managed, including when
    /// the cover cannot be fetched or decoded.
    pub async fn classify(&self, playlist: &Playlist) -> Option<Definition> {
        let cover = playlist.cover.as_ref().filter(|c| c.is_dimensionless())?;
        self.read_definition(&playlist.id, cover).await
    }

    async fn read_definition(&self, playlist_id: &str, cover: &CoverImage) -> Option<Definition> {
        let bytes = match transport::fetch_bytes(self.http.as_ref(), &cover.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(playlist_id, error = %e, "Cover not readable");
                return None;
            }
        };
        let comment = marker::extract_comment(&bytes)
            .map_err(|e| debug!(playlist_id, error = %e, "Cover has no readable comment"))
            .ok()?;
        definition::decode(comment.as_bytes())
            .map_err(|e| debug!(playlist_id, error = %e, "Cover comment is not a definition"))
            .ok()
    }

    pub async fn is_managed(&self, playlist: &Playlist) -> bool {
        self.classify(playlist).await.is_some()
    }

    /// The definition currently published on the playlist's cover
    ///
    /// Reads the live cover rather than `managed`'s own fields, so it reflects
    /// what other clients will see.
    pub async fn definition_of(&self, managed: &ManagedPlaylist) -> Result<Option<Definition>> {
        let cover = self.store.get_cover_image(&managed.playlist.id).await?;
        Ok(match cover {
            Some(cover) if cover.is_dimensionless() => {
                self.read_definition(&managed.playlist.id, &cover).await
            }
            _ => None,
        })
    }

    /// Tracks `definition` resolves to right now, without pushing them
    pub async fn preview(&self, definition: &Definition) -> Result<Vec<Track>> {
        self.resolve_tracks(definition).await
    }

    /// Remove a managed playlist from the user's library
    #[instrument(skip(self, managed), fields(playlist_id = %managed.playlist.id))]
    pub async fn delete(&self, managed: &ManagedPlaylist) -> Result<()> {
        self.store.unfollow_playlist(&managed.playlist.id).await?;
        info!("Managed playlist removed");
        Ok(())
    }

    async fn rebuild(&self, playlist: Playlist, definition: Definition) -> Result<ManagedPlaylist> {
        let (included, excluded, required, required_artists) = futures::try_join!(
            self.get_playlists(&definition.included),
            self.get_playlists(&definition.excluded),
            self.get_playlists(&definition.required),
            self.get_artists(&definition.required_artists),
        )?;

        Ok(ManagedPlaylist {
            playlist,
            included,
            excluded,
            required,
            required_artists,
            duration_limits: definition.duration_limits.unwrap_or_default(),
            release_year_limits: definition.release_year_limits.unwrap_or_default(),
            state: SyncState::Idle,
        })
    }

    async fn get_playlists(&self, ids: &[String]) -> Result<Vec<Playlist>> {
        Ok(try_join_all(ids.iter().map(|id| self.store.get_playlist(id))).await?)
    }

    async fn get_artists(&self, ids: &[String]) -> Result<Vec<Artist>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.get_artists(ids).await?)
    }

    async fn resolve_tracks(&self, definition: &Definition) -> Result<Vec<Track>> {
        let (included, excluded, required) = futures::try_join!(
            self.get_tracks(&definition.included),
            self.get_tracks(&definition.excluded),
            self.get_tracks(&definition.required),
        )?;

        let tracks = resolver::resolve(included, &excluded, &required, &Filters::from(definition));
        debug!(count = tracks.len(), "Resolved tracks");
        Ok(tracks)
    }

    async fn get_tracks(&self, playlist_ids: &[String]) -> Result<Vec<Track>> {
        let pages = try_join_all(playlist_ids.iter().map(|id| self.store.get_tracks(id))).await?;
        Ok(pages.into_iter().flatten().collect())
    }

    async fn upload_cover(&self, playlist_id: &str, payload: &str) -> Result<()> {
        retry_with(
            self.config.cover_upload,
            self.sleeper.as_ref(),
            |_| self.store.set_cover_image(playlist_id, payload),
            |attempt, error| {
                if error.is_auth_failure() {
                    return false;
                }
                warn!(playlist_id, attempt, error = %error, "Cover upload failed, retrying");
                self.emit(SyncEvent::CoverUploadRetrying {
                    playlist_id: playlist_id.to_string(),
                    attempt,
                    message: error.to_string(),
                });
                true
            },
        )
        .await
        .map_err(|(error, attempts)| {
            if error.is_auth_failure() {
                SyncError::Bridge(error)
            } else {
                SyncError::CoverUploadExhausted {
                    playlist_id: playlist_id.to_string(),
                    attempts,
                    message: error.to_string(),
                }
            }
        })
    }

    /// Wait for the uploaded cover and record whether it showed up
    async fn settle_cover(&self, managed: &mut ManagedPlaylist) {
        let playlist_id = managed.playlist.id.as_str();
        let store = self.store.as_ref();

        let cover = poll_until(
            self.config.cover_poll_attempts,
            self.config.cover_poll_delay,
            self.sleeper.as_ref(),
            |_| async move {
                match store.get_cover_image(playlist_id).await {
                    Ok(cover) => cover.filter(CoverImage::is_dimensionless),
                    Err(e) => {
                        debug!(playlist_id, error = %e, "Cover lookup failed");
                        None
                    }
                }
            },
        )
        .await;

        managed.state = if cover.is_some() {
            SyncState::Idle
        } else {
            warn!(playlist_id, "Uploaded cover did not become visible");
            SyncState::Unconverged
        };
        managed.playlist.cover = cover;
    }

    fn finish(&self, managed: ManagedPlaylist, result: Result<usize>) -> Result<ManagedPlaylist> {
        match result {
            Ok(track_count) => {
                info!(
                    playlist_id = %managed.playlist.id,
                    track_count,
                    state = %managed.state,
                    "Sync completed"
                );
                self.emit(SyncEvent::Completed {
                    playlist_id: managed.playlist.id.clone(),
                    track_count: track_count as u64,
                    converged: managed.state.is_converged(),
                });
                Ok(managed)
            }
            Err(error) => Err(self.fail(Some(&managed.playlist.id), error)),
        }
    }

    fn fail(&self, playlist_id: Option<&str>, error: SyncError) -> SyncError {
        warn!(playlist_id, error = %error, "Sync failed");
        self.emit(SyncEvent::Failed {
            playlist_id: playlist_id.map(str::to_string),
            message: error.to_string(),
        });
        error
    }

    fn emit_started(&self, playlist_id: &str, operation: &str) {
        info!(playlist_id, operation, "Sync started");
        self.emit(SyncEvent::Started {
            playlist_id: playlist_id.to_string(),
            operation: operation.to_string(),
        });
    }

    fn emit(&self, event: SyncEvent) {
        // Events are advisory; a bus without subscribers is fine
        let _ = self.event_bus.emit(CoreEvent::Sync(event));
    }
}

/// Encode `definition`, embed it into `cover` and produce the upload body
fn embed_definition(cover: &[u8], definition: &Definition) -> Result<String> {
    let encoded = definition::encode(definition)?;
    let with_comment = marker::embed_comment(cover, &encoded)?;
    Ok(transport::to_upload_payload(&with_comment))
}

fn default_cover(name: &str) -> Result<Vec<u8>> {
    let color = generate::PALETTE[name.len() % generate::PALETTE.len()];
    let rgb = generate::parse_hex_color(color)?;
    Ok(generate::single_color_jpeg(
        DEFAULT_COVER_SIZE,
        DEFAULT_COVER_SIZE,
        rgb,
    )?)
}

fn uris(tracks: &[Track]) -> Vec<String> {
    tracks.iter().map(|t| t.uri.clone()).collect()
}
