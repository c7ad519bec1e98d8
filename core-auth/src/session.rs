//! # Session Context
//!
//! Explicit login state for one user. A `SessionContext` is created at
//! startup, started once credentials are available, and invalidated on logout
//! or when the remote service rejects the credentials. Every component that
//! needs a token asks the session it was constructed with; there is no
//! process-wide flag.
//!
//! ```text
//! new() ──> SignedOut ──start()──> SignedIn ──invalidate()──> Invalidated
//!                                     ^                           |
//!                                     +--------- start() ---------+
//! ```

use std::sync::Arc;

use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::credentials::CredentialProvider;
use crate::error::{AuthError, Result};
use crate::types::{AccessToken, AuthState};

/// Login state shared by the connector and the façade
pub struct SessionContext {
    provider: Arc<dyn CredentialProvider>,
    state: RwLock<AuthState>,
    event_bus: Option<EventBus>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            state: RwLock::new(AuthState::SignedOut),
            event_bus: None,
        }
    }

    /// Publish `SignedIn`/`SignedOut` events on `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Verify credentials are available and mark the session signed in
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; the state is left unchanged.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.provider.access_token().await?;

        *self.state.write().await = AuthState::SignedIn { user_id: None };
        info!("Session started");
        Ok(())
    }

    /// Record the account the credentials belong to
    pub async fn identify(&self, user_id: impl Into<String>) -> Result<()> {
        let user_id = user_id.into();
        {
            let mut state = self.state.write().await;
            if !state.is_authenticated() {
                return Err(self.not_authenticated(&state));
            }
            *state = AuthState::SignedIn {
                user_id: Some(user_id.clone()),
            };
        }

        debug!(user_id = %user_id, "Session identified");
        self.emit(AuthEvent::SignedIn { user_id });
        Ok(())
    }

    /// Token for the next request
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` before `start`
    /// - `SessionInvalidated` after `invalidate`
    /// - the provider's error otherwise
    pub async fn access_token(&self) -> Result<AccessToken> {
        {
            let state = self.state.read().await;
            if !state.is_authenticated() {
                return Err(self.not_authenticated(&state));
            }
        }
        self.provider.access_token().await
    }

    /// End the session and revoke stored credentials
    ///
    /// Revocation failures are logged; the session is invalidated regardless.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, reason: &str) {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(
                &mut *state,
                AuthState::Invalidated {
                    reason: reason.to_string(),
                },
            )
        };

        if let Err(e) = self.provider.revoke().await {
            warn!(error = %e, "Failed to revoke credentials");
        }

        info!("Session invalidated");
        self.emit(AuthEvent::SignedOut {
            user_id: previous.user_id().map(str::to_string),
            reason: reason.to_string(),
        });
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    fn not_authenticated(&self, state: &AuthState) -> AuthError {
        match state {
            AuthState::Invalidated { reason } => AuthError::SessionInvalidated {
                reason: reason.clone(),
            },
            _ => AuthError::NotAuthenticated,
        }
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is not an error for the session
            let _ = bus.emit(CoreEvent::Auth(event));
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("provider", &"CredentialProvider { ... }")
            .field("has_event_bus", &self.event_bus.is_some())
            .finish()
    }
}
