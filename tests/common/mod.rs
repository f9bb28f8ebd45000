#![allow(dead_code)]

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde::Deserialize;
use serde_json::json;
use statusphere::config::Config;
use statusphere::server;
use statusphere::state::AppState;
use statusphere::store::Store;
use tokio::sync::oneshot;
use tower::ServiceExt;

pub const COOKIE_SECRET: &str = "integration-test-cookie-secret-0123456789";
pub const APP_PASSWORD: &str = "abcd-efgh-ijkl-mnop";
pub const ALICE_DID: &str = "did:plc:abc";
pub const BOB_DID: &str = "did:plc:bob";

// ============================================================================
// Store and application
// ============================================================================

pub async fn memory_store() -> Store {
    let store = Store::connect("sqlite::memory:").await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

pub fn test_config(pds_host: &str, public_url: &str) -> Config {
    let pds_host = pds_host.to_owned();
    let public_url = public_url.to_owned();
    Config::from_lookup(move |key| match key {
        "COOKIE_SECRET" => Some(COOKIE_SECRET.to_owned()),
        "APP_ENV" => Some("test".to_owned()),
        "ATPROTO_PDS_HOST" => Some(pds_host.clone()),
        "PUBLIC_URL" => Some(public_url.clone()),
        _ => None,
    })
    .expect("config")
}

pub struct TestApp {
    pub router: Router,
    pub store: Store,
}

pub async fn test_app(pds_host: &str) -> TestApp {
    test_app_with(test_config(pds_host, "")).await
}

pub async fn test_app_with(config: Config) -> TestApp {
    let store = memory_store().await;
    let state = AppState::new(config, store.clone()).expect("state");
    let router = server::router(state).expect("router");
    TestApp { router, store }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("infallible")
    }

    /// Logs `handle` in against the stub PDS and returns the session cookie.
    pub async fn login(&self, handle: &str) -> String {
        let body = format!("handle={handle}&password={APP_PASSWORD}");
        let response = self.send(form_post("/login", &body, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("session cookie")
    }
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).expect("request")
}

/// The `sid=…` pair from the response's Set-Cookie header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("sid="))
        .and_then(|value| value.split(';').next())
        .map(str::to_owned)
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

// ============================================================================
// Stub PDS
// ============================================================================

/// An in-process stand-in for a personal data server. Shuts down on drop.
pub struct StubPds {
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for StubPds {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn spawn_pds() -> StubPds {
    let app = Router::new()
        .route(
            "/xrpc/com.atproto.server.createSession",
            post(create_session),
        )
        .route("/xrpc/app.bsky.actor.getProfile", get(get_profile));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    StubPds {
        url: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
    }
}

#[derive(Deserialize)]
struct CreateSessionInput {
    identifier: String,
    password: String,
}

async fn create_session(Json(input): Json<CreateSessionInput>) -> Response {
    match (input.identifier.as_str(), input.password.as_str()) {
        ("broken.test", _) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        (handle @ ("alice.test" | "bob.test"), APP_PASSWORD) => {
            let did = if handle == "alice.test" { ALICE_DID } else { BOB_DID };
            Json(json!({
                "accessJwt": format!("access-{handle}"),
                "refreshJwt": format!("refresh-{handle}"),
                "handle": handle,
                "did": did,
            }))
            .into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "AuthenticationRequired",
                "message": "Invalid identifier or password",
            })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct ProfileQuery {
    actor: String,
}

async fn get_profile(headers: HeaderMap, Query(query): Query<ProfileQuery>) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer access-"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "AuthenticationRequired", "message": "Invalid token" })),
        )
            .into_response();
    }

    match query.actor.as_str() {
        ALICE_DID | "alice.test" => Json(json!({
            "did": ALICE_DID,
            "handle": "alice.test",
            "displayName": "Alice",
            "description": "Testing statuses",
            "followersCount": 3,
            "followsCount": 5,
        }))
        .into_response(),
        BOB_DID | "bob.test" => Json(json!({ "did": BOB_DID, "handle": "bob.test" })).into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "InvalidRequest", "message": "Profile not found" })),
        )
            .into_response(),
    }
}
