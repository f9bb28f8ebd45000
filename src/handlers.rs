//! HTTP handlers.

use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use maud::Markup;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::atproto::ClientError;
use crate::error::AppError;
use crate::record::{iso8601, new_tid, status_uri};
use crate::session::{AppSession, SessionUser};
use crate::state::AppState;
use crate::store::{Status, StoreError};
use crate::views::HomePage;

/// Number of statuses shown on the home page.
pub const RECENT_LIMIT: u64 = 10;

/// OAuth client descriptor served at `/client-metadata.json`.
#[derive(Debug, Serialize)]
pub struct ClientMetadata {
    pub client_name: &'static str,
    pub client_id: String,
    pub client_uri: String,
    pub redirect_uris: Vec<String>,
    pub scope: &'static str,
    pub grant_types: [&'static str; 2],
    pub response_types: [&'static str; 1],
    pub application_type: &'static str,
    pub token_endpoint_auth_method: &'static str,
    pub dpop_bound_access_tokens: bool,
}

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    handle: String,
    #[serde(default)]
    password: String,
}

pub async fn client_metadata(State(state): State<AppState>, headers: HeaderMap) -> Json<ClientMetadata> {
    let public_url = if state.config.public_url.is_empty() {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{host}")
    } else {
        state.config.public_url.clone()
    };

    Json(ClientMetadata {
        client_name: "Statusphere",
        client_id: format!("{public_url}/client-metadata.json"),
        redirect_uris: vec![format!("{public_url}/oauth/callback")],
        client_uri: public_url,
        scope: "atproto transition:generic",
        grant_types: ["authorization_code", "refresh_token"],
        response_types: ["code"],
        application_type: "web",
        token_endpoint_auth_method: "none",
        dpop_bound_access_tokens: true,
    })
}

/// The OAuth handshake is not implemented; sign-in goes through app passwords.
pub async fn oauth_callback() -> Redirect {
    Redirect::to("/?error=not_implemented")
}

pub async fn show_login(State(state): State<AppState>) -> Markup {
    state.views.login(None)
}

pub async fn login(
    State(state): State<AppState>,
    session: AppSession,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form.map_err(|_| AppError::Validation("Invalid form data".to_owned()))?;

    let client = state.atproto();
    let auth = match client.login(&form.handle, &form.password).await {
        Ok(auth) => auth,
        Err(err) => {
            warn!(error = %err, handle = %form.handle, "login failed");
            let (status, message) = match &err {
                ClientError::MissingCredentials => (
                    StatusCode::BAD_REQUEST,
                    "Handle and app password are required".to_owned(),
                ),
                ClientError::Rejected(_) => (StatusCode::UNAUTHORIZED, err.to_string()),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "Could not reach your server, try again later".to_owned(),
                ),
            };
            return Ok((status, state.views.login(Some(&message))).into_response());
        }
    };

    let display_name = match client.get_profile(&auth.did).await {
        Ok(profile) => profile
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| auth.handle.clone()),
        Err(err) => {
            debug!(error = %err, did = %auth.did, "profile unavailable, using handle");
            auth.handle.clone()
        }
    };

    state
        .store
        .save_auth_session(&auth.did, &serde_json::to_string(&auth)?)
        .await?;
    session
        .set_all(&SessionUser::new(&auth.did, display_name))
        .await?;

    info!(did = %auth.did, "user logged in");
    Ok(Redirect::to("/").into_response())
}

pub async fn logout(State(state): State<AppState>, session: AppSession) -> Result<Redirect, AppError> {
    let user = session.user().await;
    if let Some(did) = user.identity() {
        state.store.delete_auth_session(did).await?;
    }
    session.clear().await?;
    Ok(Redirect::to("/"))
}

pub async fn home(
    State(state): State<AppState>,
    session: AppSession,
    Query(query): Query<HomeQuery>,
) -> Result<Markup, AppError> {
    let statuses = state.store.recent_statuses(RECENT_LIMIT).await?;
    let user = session.user().await;

    let my_status = match user.identity() {
        Some(did) => match state.store.user_status(did).await {
            Ok(status) => Some(status),
            Err(StoreError::NotFound) => {
                debug!(did, "user has no status yet");
                None
            }
            Err(err) => return Err(err.into()),
        },
        None => None,
    };

    let display_name = user
        .identity()
        .map(|did| user.display_name.as_deref().unwrap_or(did));

    Ok(state.views.home(&HomePage {
        statuses: &statuses,
        my_status: my_status.as_ref(),
        display_name,
        notice: query.error.as_deref().map(notice_for),
    }))
}

pub async fn update_status(
    State(state): State<AppState>,
    session: AppSession,
    form: Result<Form<StatusForm>, FormRejection>,
) -> Result<Redirect, AppError> {
    let user = session.user().await;
    let author = user.identity().ok_or(AppError::Unauthorized)?;

    let Form(form) = form.map_err(|_| AppError::Validation("Invalid form data".to_owned()))?;
    if form.status.trim().is_empty() {
        return Err(AppError::Validation("Invalid status".to_owned()));
    }

    let now = OffsetDateTime::now_utc();
    let timestamp = iso8601(now);
    let record = Status {
        uri: status_uri(author, &new_tid(now)),
        author_id: author.to_owned(),
        text: form.status,
        created_at: timestamp.clone(),
        indexed_at: timestamp,
    };
    state.store.save_status(&record).await?;

    debug!(uri = %record.uri, "status updated");
    Ok(Redirect::to("/"))
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 Not Found")
}

fn notice_for(code: &str) -> &str {
    match code {
        "not_implemented" => "OAuth sign-in is not available yet. Log in with an app password.",
        other => other,
    }
}
