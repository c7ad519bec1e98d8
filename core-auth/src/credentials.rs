//! Credential sources.
//!
//! The sync core never runs an authorization flow itself. Hosts obtain a
//! token however they like (PKCE in a browser, a CLI prompt, a secret store)
//! and hand it over through a [`CredentialProvider`].

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::types::AccessToken;

/// Source of bearer tokens for Web API requests
///
/// # Example
///
/// ```ignore
/// use core_auth::{AccessToken, CredentialProvider};
///
/// struct Keychain;
///
/// #[async_trait::async_trait]
/// impl CredentialProvider for Keychain {
///     async fn access_token(&self) -> core_auth::Result<AccessToken> {
///         Ok(AccessToken::new(read_keychain("spotify")?))
///     }
///
///     async fn revoke(&self) -> core_auth::Result<()> {
///         delete_keychain("spotify")
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a token that is currently valid
    ///
    /// Implementations that can refresh should do so here.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when no valid credential can be produced.
    async fn access_token(&self) -> Result<AccessToken>;

    /// Forget stored credentials
    async fn revoke(&self) -> Result<()>;
}

/// Credentials obtained out of band
///
/// Holds a single token. Once it expires or is revoked, requests fail with an
/// authentication error until the host installs a new one.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<AccessToken>>,
}

impl StaticCredentials {
    pub fn new(token: AccessToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }

    /// Install a fresh token, replacing any previous one
    pub async fn replace(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Result<AccessToken> {
        let guard = self.token.read().await;
        let token = guard.as_ref().ok_or(AuthError::NotAuthenticated)?;

        match token.expires_at {
            Some(expires_at) if token.is_expired_with_buffer(0) => {
                debug!(%expires_at, "Static access token expired");
                Err(AuthError::TokenExpired { expires_at })
            }
            _ => Ok(token.clone()),
        }
    }

    async fn revoke(&self) -> Result<()> {
        self.token.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_static_credentials_returns_token() {
        let credentials = StaticCredentials::new(AccessToken::new("BQD1").expiring_in(3600));
        let token = credentials.access_token().await.unwrap();
        assert_eq!(token.secret(), "BQD1");
    }

    #[tokio::test]
    async fn test_static_credentials_expired() {
        let credentials = StaticCredentials::new(
            AccessToken::new("BQD1").expiring_at(Utc::now() - Duration::minutes(5)),
        );
        assert!(matches!(
            credentials.access_token().await,
            Err(AuthError::TokenExpired { .. })
        ));
    }

    #[tokio::test]
    async fn test_static_credentials_revoke_and_replace() {
        let credentials = StaticCredentials::new(AccessToken::new("BQD1"));

        credentials.revoke().await.unwrap();
        assert!(matches!(
            credentials.access_token().await,
            Err(AuthError::NotAuthenticated)
        ));

        credentials.replace(AccessToken::new("BQD2")).await;
        assert_eq!(credentials.access_token().await.unwrap().secret(), "BQD2");
    }

    #[tokio::test]
    async fn test_default_is_signed_out() {
        let credentials = StaticCredentials::default();
        assert!(credentials.access_token().await.is_err());
    }
}
