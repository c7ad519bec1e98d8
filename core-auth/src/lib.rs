//! # Authentication Module
//!
//! Session lifecycle and credential plumbing for Web API access.
//!
//! ## Overview
//!
//! - **Credentials** (`credentials`): the [`CredentialProvider`] trait hosts
//!   implement, plus [`StaticCredentials`] for tokens obtained out of band
//! - **Session** (`session`): [`SessionContext`], the explicit login state the
//!   connector draws tokens from and the façade invalidates on rejection
//! - **Types** (`types`): [`AccessToken`] with a redacted `Debug`, [`AuthState`]
//!
//! The authorization flow itself (PKCE redirect, token exchange) belongs to
//! the host.

pub mod credentials;
pub mod error;
pub mod session;
pub mod types;

pub use credentials::{CredentialProvider, StaticCredentials};
pub use error::{AuthError, Result};
pub use session::SessionContext;
pub use types::{AccessToken, AuthState};
