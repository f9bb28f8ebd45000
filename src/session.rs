//! Cookie session for the signed-in browser.
//!
//! Sessions are managed by `tower-sessions`: the browser holds a signed `sid`
//! cookie carrying only the session id, and the session map itself is kept in
//! the database through
//! [`SqliteSessionStore`](crate::session_store::SqliteSessionStore). Handlers never touch the raw
//! map; they go through [`AppSession`], which exposes a single typed
//! [`SessionUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;
use time::Duration;
use tower_sessions::cookie::Key;
use tower_sessions::Session;
use tracing::warn;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "sid";

/// Cookie and record lifetime.
pub const MAX_AGE: Duration = Duration::days(30);

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const USER_KEY: &str = "user";

/// Errors from the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The signing secret cannot produce a key. This is a configuration
    /// problem and aborts startup.
    #[error("cookie secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    WeakSecret(usize),
    /// The session record could not be written.
    #[error("session write failed: {0}")]
    Write(#[from] tower_sessions::session::Error),
}

/// What the session knows about the browser's user. Both fields are empty for
/// anonymous visitors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub identity_id: Option<String>,
    pub display_name: Option<String>,
}

impl SessionUser {
    pub fn new(identity_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity_id: Some(identity_id.into()),
            display_name: Some(display_name.into()),
        }
    }

    /// The identity reference, if the user is signed in.
    pub fn identity(&self) -> Option<&str> {
        self.identity_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Derives the cookie signing key from the configured secret.
///
/// The secret is stretched to the 64 bytes the cookie key needs with SHA-512.
pub fn signing_key(secret: &str) -> Result<Key, SessionError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(SessionError::WeakSecret(secret.len()));
    }
    let digest = Sha512::digest(secret.as_bytes());
    Ok(Key::from(digest.as_slice()))
}

/// Typed view over the request's [`Session`].
#[derive(Debug, Clone)]
pub struct AppSession {
    session: Session,
}

impl AppSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// The session user. Any failure to read the record is treated as an
    /// anonymous session.
    pub async fn user(&self) -> SessionUser {
        match self.session.get::<SessionUser>(USER_KEY).await {
            Ok(user) => user.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "unreadable session, treating as anonymous");
                SessionUser::default()
            }
        }
    }

    /// Replaces the session user. The session id is cycled first so an id
    /// handed out before sign-in never becomes authenticated.
    pub async fn set_all(&self, user: &SessionUser) -> Result<(), SessionError> {
        self.session.cycle_id().await?;
        self.session.insert(USER_KEY, user).await?;
        Ok(())
    }

    /// Drops every key, deletes the stored record and expires the cookie.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.session.flush().await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AppSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        let err = signing_key("too-short").unwrap_err();
        assert!(matches!(err, SessionError::WeakSecret(9)));
        assert!(signing_key(&"x".repeat(MIN_SECRET_LEN)).is_ok());
    }

    #[test]
    fn blank_identity_counts_as_anonymous() {
        let user = SessionUser {
            identity_id: Some(String::new()),
            display_name: None,
        };
        assert_eq!(user.identity(), None);
        assert_eq!(SessionUser::new("did:plc:abc", "Alice").identity(), Some("did:plc:abc"));
    }
}
