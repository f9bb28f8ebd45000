//! Thin client for the AT Protocol XRPC endpoints the app needs: app-password
//! login and profile lookup. It carries no business logic.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::AtprotoConfig;

const CREATE_SESSION: &str = "xrpc/com.atproto.server.createSession";
const GET_PROFILE: &str = "xrpc/app.bsky.actor.getProfile";

/// Protocol client failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("PDS host is required")]
    MissingHost,
    #[error("identifier and password are required")]
    MissingCredentials,
    /// The server refused the credentials.
    #[error("login rejected: {0}")]
    Rejected(String),
    #[error("client not authenticated")]
    Unauthenticated,
    #[error("profile not found: {0}")]
    NotFound(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Tokens and identity returned by `createSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub handle: String,
    pub did: String,
}

/// Detailed profile view from `app.bsky.actor.getProfile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub follows_count: u64,
}

#[derive(Debug, Deserialize)]
struct XrpcError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// XRPC client bound to one PDS host.
///
/// Each instance tracks its own login; use [`AtpClient::fresh`] to get an
/// unauthenticated client sharing the same connection pool.
#[derive(Debug, Clone)]
pub struct AtpClient {
    http: Client,
    host: String,
    auth: Arc<RwLock<Option<AuthInfo>>>,
}

impl AtpClient {
    /// Builds a client for the configured PDS host.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingHost`] for an empty host and
    /// [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &AtprotoConfig) -> Result<Self, ClientError> {
        let host = config.pds_host.trim_end_matches('/');
        if host.is_empty() {
            return Err(ClientError::MissingHost);
        }
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            host: host.to_owned(),
            auth: Arc::new(RwLock::new(None)),
        })
    }

    /// An unauthenticated client for the same host and connection pool.
    pub fn fresh(&self) -> Self {
        Self {
            http: self.http.clone(),
            host: self.host.clone(),
            auth: Arc::new(RwLock::new(None)),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn is_logged_in(&self) -> bool {
        self.auth.read().await.is_some()
    }

    /// Exchanges an identifier and app password for session tokens.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthInfo, ClientError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        let response = self
            .http
            .post(format!("{}/{CREATE_SESSION}", self.host))
            .json(&serde_json::json!({
                "identifier": identifier.trim(),
                "password": password,
            }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let info: AuthInfo = response.json().await?;
                debug!(did = %info.did, handle = %info.handle, "protocol session created");
                *self.auth.write().await = Some(info.clone());
                Ok(info)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(ClientError::Rejected(error_message(response).await))
            }
            status => Err(ClientError::Remote(format!(
                "createSession failed: status {status}"
            ))),
        }
    }

    /// Fetches the profile of `actor` (a handle or DID). Requires a prior
    /// successful [`login`](Self::login).
    pub async fn get_profile(&self, actor: &str) -> Result<Profile, ClientError> {
        let token = match self.auth.read().await.as_ref() {
            Some(info) => info.access_jwt.clone(),
            None => return Err(ClientError::Unauthenticated),
        };

        let response = self
            .http
            .get(format!("{}/{GET_PROFILE}", self.host))
            .query(&[("actor", actor)])
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(ClientError::NotFound(actor.to_owned()))
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthenticated),
            status => Err(ClientError::Remote(format!(
                "getProfile failed: status {status}: {}",
                error_message(response).await
            ))),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<XrpcError>().await {
        Ok(body) if !body.message.is_empty() => body.message,
        Ok(body) if !body.error.is_empty() => body.error,
        _ => "no error detail".to_owned(),
    }
}
