//! # Statusphere
//!
//! A small web application where users sign in with their AT Protocol
//! identity and publish a one-line status. Built on [`axum`], with
//! [`tower-sessions`](https://crates.io/crates/tower-sessions) cookie sessions
//! and [Sea-ORM](https://crates.io/crates/sea-orm) over SQLite.
//!
//! ## Components
//!
//! - [`store::Store`]: status records, protocol auth sessions and auth states.
//! - [`session_store::SqliteSessionStore`]: server-side storage for the signed
//!   `sid` cookie session.
//! - [`session::AppSession`]: typed access to the signed-in user.
//! - [`atproto::AtpClient`]: app-password login and profile lookup.
//! - [`server::router`]: routes, middleware and graceful shutdown.
//!
//! ## Quick Start
//!
//! ```no_run
//! use statusphere::config::Config;
//! use statusphere::server;
//! use statusphere::state::AppState;
//! use statusphere::store::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let store = Store::connect(&config.database_url()).await?;
//! store.migrate().await?;
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! let app = server::router(AppState::new(config, store)?)?;
//! server::serve(listener, app, server::shutdown_signal(), server::SHUTDOWN_GRACE).await?;
//! # Ok(())
//! # }
//! ```

pub mod atproto;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod record;
pub mod server;
pub mod session;
pub mod session_store;
pub mod state;
pub mod store;
pub mod views;

pub use error::AppError;
pub use session_store::SqliteSessionStore;
pub use store::{Status, Store, StoreError};

/// Re-exported from `tower-sessions` for implementing or driving the session
/// store directly.
pub use tower_sessions::{ExpiredDeletion, SessionStore};
