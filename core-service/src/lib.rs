//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`CoreConfig`] and a host credential provider into the
//! synchronization engine: session, Spotify connector (optionally behind the
//! request cache), event bus and orchestrator. Desktop hosts typically enable
//! the `desktop-shims` feature so the config falls back to the reqwest client
//! and the tokio sleeper.
//!
//! Every remote operation runs behind a logged-in guard. Calls made without an
//! active session fail before any request is sent, and a credential rejection
//! from the remote store ends the session.
//!
//! The request cache lives for one operation at a time. It is emptied before
//! each operation starts, so repeated reads within a run share responses
//! while every new operation sees the remote store's current state.

pub mod error;

pub use error::{CoreError, Result};

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use bridge_traits::http::HttpClient;
use bridge_traits::playlist::{Playlist, PlaylistStore, Track, User};
use core_auth::{AuthError, AuthState, CredentialProvider, SessionContext};
use core_runtime::events::{CoreEvent, EventBus};
use core_runtime::CoreConfig;
use core_sync::{
    CreateRequest, Definition, ManagedPlaylist, SyncConfig, SyncOrchestrator, UpdateRequest,
};
use provider_spotify::{CachedHttpClient, SpotifyConnector};
use tokio::sync::broadcast::Receiver;
use tracing::{info, instrument, warn};

/// Primary façade exposed to host applications.
pub struct SyncService {
    session: Arc<SessionContext>,
    cache: Option<Arc<CachedHttpClient>>,
    connector: Arc<SpotifyConnector>,
    orchestrator: SyncOrchestrator,
    event_bus: EventBus,
}

impl SyncService {
    /// Build the service graph from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid.
    pub fn new(config: CoreConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let session =
            Arc::new(SessionContext::new(credentials).with_event_bus(event_bus.clone()));

        let cache = if config.features.enable_request_cache {
            let capacity = NonZeroUsize::new(config.request_cache_capacity).ok_or_else(|| {
                CoreError::InitializationFailed("request cache capacity is 0".to_string())
            })?;
            Some(Arc::new(CachedHttpClient::new(
                config.http_client.clone(),
                capacity,
            )))
        } else {
            None
        };

        let api_client: Arc<dyn HttpClient> = match &cache {
            Some(cache) => cache.clone(),
            None => config.http_client.clone(),
        };

        let connector = Arc::new(
            SpotifyConnector::new(api_client, session.clone())
                .with_base_url(config.api_base_url.clone())
                .with_timeout(config.request_timeout),
        );

        // Cover bytes come from the image host, never from the API cache
        let orchestrator = SyncOrchestrator::new(
            connector.clone(),
            config.http_client.clone(),
            config.sleeper.clone(),
            event_bus.clone(),
            SyncConfig::from(&config),
        );

        Ok(Self {
            session,
            cache,
            connector,
            orchestrator,
            event_bus,
        })
    }

    /// Start a session and resolve the signed-in account.
    ///
    /// An account the application does not admit ends the session again.
    #[instrument(skip(self))]
    pub async fn login(&self) -> Result<User> {
        self.session.start().await?;

        let user = self.guarded(self.connector.current_user()).await?;
        self.session.identify(user.id.clone()).await?;

        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// End the session and forget cached responses.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end_session("logout").await;
    }

    pub async fn auth_state(&self) -> AuthState {
        self.session.state().await
    }

    /// Subscribe to auth and sync events.
    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// The playlists of the signed-in account, managed or not.
    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        self.guarded(self.connector.list_playlists()).await
    }

    /// Managed playlists of the signed-in account.
    pub async fn list_managed(&self) -> Result<Vec<ManagedPlaylist>> {
        self.guarded(self.orchestrator.list_managed()).await
    }

    pub async fn create(&self, request: CreateRequest) -> Result<ManagedPlaylist> {
        self.guarded(self.orchestrator.create(request)).await
    }

    pub async fn update(
        &self,
        managed: ManagedPlaylist,
        request: UpdateRequest,
    ) -> Result<ManagedPlaylist> {
        self.guarded(self.orchestrator.update(managed, request)).await
    }

    pub async fn synchronize(&self, managed: &ManagedPlaylist) -> Result<ManagedPlaylist> {
        self.guarded(self.orchestrator.synchronize(managed)).await
    }

    /// Tracks a definition would produce, without writing anything.
    pub async fn preview(&self, definition: &Definition) -> Result<Vec<Track>> {
        self.guarded(self.orchestrator.preview(definition)).await
    }

    pub async fn delete(&self, managed: &ManagedPlaylist) -> Result<()> {
        self.guarded(self.orchestrator.delete(managed)).await
    }

    /// Run `operation` only with an active session and end the session when
    /// the remote store rejects its credentials.
    ///
    /// Responses cached by an earlier operation are dropped first.
    async fn guarded<T, E, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<CoreError>,
    {
        if !self.session.is_active().await {
            return Err(match self.session.state().await {
                AuthState::Invalidated { reason } => AuthError::SessionInvalidated { reason },
                _ => AuthError::NotAuthenticated,
            }
            .into());
        }
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }

        match operation.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let error: CoreError = e.into();
                if error.is_auth_failure() {
                    warn!(error = %error, "Credentials rejected; ending session");
                    self.end_session(&error.to_string()).await;
                }
                Err(error)
            }
        }
    }

    async fn end_session(&self, reason: &str) {
        self.session.invalidate(reason).await;
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }
}
