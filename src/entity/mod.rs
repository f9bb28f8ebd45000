//! Database entity models for statusphere.
//!
//! This module contains the Sea-ORM entity definitions backing the
//! [`Store`](crate::store::Store). Three tables hold application data
//! (`status`, `auth_session`, `auth_state`); the fourth (`http_session`) holds
//! the server-side half of the signed cookie session.

/// Status records posted by users.
pub mod status;

/// Completed protocol logins, keyed by identity reference.
pub mod auth_session;

/// In-flight protocol login handshakes.
pub mod auth_state;

/// Session records for the `tower-sessions` cookie layer.
pub mod http_session;
