//! Router assembly, middleware and the serve loop.

use std::any::Any;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{error, info, warn};

use crate::handlers;
use crate::session::{self, SessionError, COOKIE_NAME, MAX_AGE};
use crate::state::AppState;

/// How long in-flight requests may run after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Upper bound on a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds the full application router.
///
/// # Errors
///
/// Fails with [`SessionError::WeakSecret`] when the configured cookie secret
/// cannot be used for signing.
pub fn router(state: AppState) -> Result<Router, SessionError> {
    let key = session::signing_key(&state.config.cookie_secret)?;
    let session_layer = SessionManagerLayer::new(state.store.sessions())
        .with_name(COOKIE_NAME)
        .with_path("/")
        .with_http_only(true)
        .with_secure(state.config.is_production())
        .with_expiry(Expiry::OnInactivity(MAX_AGE))
        .with_signed(key);

    let static_files = ServeDir::new(&state.config.static_dir);

    let app = Router::new()
        .route("/client-metadata.json", get(handlers::client_metadata))
        .route("/oauth/callback", get(handlers::oauth_callback))
        .route("/login", get(handlers::show_login).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/", get(handlers::home))
        .route("/status", post(handlers::update_status))
        .nest_service("/public", static_files)
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(session_layer);

    Ok(with_middleware(app))
}

/// Wraps `router` in request timeout, panic recovery and request logging.
pub fn with_middleware(router: Router) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(log_requests))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_owned());
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        %remote_addr,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request processed"
    );
    response
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };
    error!(panic = %detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Serves `app` on `listener` until `shutdown` resolves, then drains
/// in-flight requests for at most `grace` before returning.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.await;
        info!("shutting down server");
        let _ = signalled_tx.send(());
    })
    .into_future();

    let deadline = async move {
        if signalled_rx.await.is_err() {
            // Server ended on its own; nothing to wait for.
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result?;
            info!("server exited properly");
        }
        _ = deadline => {
            warn!(grace_secs = grace.as_secs(), "grace period elapsed, forcing shutdown");
        }
    }
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
