//! SQLite persistence for statuses and protocol auth data.

use std::time::Duration;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::{debug, info};

use crate::entity::{auth_session, auth_state, status};
use crate::migration::Migrator;
use crate::session_store::SqliteSessionStore;

/// A status record as stored in the `status` table.
pub type Status = status::Model;

/// Errors returned by [`Store`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the lookup.
    #[error("record not found")]
    NotFound,
    /// The database rejected the statement or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Handle to the application database.
///
/// The underlying pool holds exactly one connection. SQLite admits a single
/// writer at a time, and routing every statement through one connection
/// serializes writes without an extra lock. Cloning is cheap and shares the
/// connection.
#[derive(Debug, Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Opens the database at `url` (for example `sqlite://./statusphere.db?mode=rwc`
    /// or `sqlite::memory:`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let mut opt = ConnectOptions::new(url.to_owned());
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        info!(url, "connected to database");
        Ok(Self { conn })
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("running database migrations");
        Migrator::up(&self.conn, None).await?;
        info!("database migrations completed");
        Ok(())
    }

    /// The underlying Sea-ORM connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// A `tower-sessions` store sharing this database connection.
    pub fn sessions(&self) -> SqliteSessionStore {
        SqliteSessionStore::new(self.conn.clone())
    }

    /// Inserts `record`, or updates `text` and `indexedAt` of the row that
    /// already holds its URI. `authorId` and `createdAt` are never rewritten.
    pub async fn save_status(&self, record: &Status) -> Result<(), StoreError> {
        let model = status::ActiveModel {
            uri: Set(record.uri.clone()),
            author_id: Set(record.author_id.clone()),
            text: Set(record.text.clone()),
            created_at: Set(record.created_at.clone()),
            indexed_at: Set(record.indexed_at.clone()),
        };

        status::Entity::insert(model)
            .on_conflict(
                OnConflict::column(status::Column::Uri)
                    .update_columns([status::Column::Text, status::Column::IndexedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        debug!(uri = %record.uri, "status saved");
        Ok(())
    }

    /// Up to `limit` statuses, most recently indexed first.
    pub async fn recent_statuses(&self, limit: u64) -> Result<Vec<Status>, StoreError> {
        let statuses = status::Entity::find()
            .order_by_desc(status::Column::IndexedAt)
            .order_by_desc(status::Column::Uri)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(statuses)
    }

    /// The most recently indexed status of `author_id`.
    ///
    /// Fails with [`StoreError::NotFound`] when the author has never posted.
    pub async fn user_status(&self, author_id: &str) -> Result<Status, StoreError> {
        status::Entity::find()
            .filter(status::Column::AuthorId.eq(author_id))
            .order_by_desc(status::Column::IndexedAt)
            .order_by_desc(status::Column::Uri)
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Removes the status at `uri`. Deleting a missing row is not an error.
    pub async fn delete_status(&self, uri: &str) -> Result<(), StoreError> {
        status::Entity::delete_by_id(uri.to_owned())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn save_auth_session(&self, key: &str, session: &str) -> Result<(), StoreError> {
        let model = auth_session::ActiveModel {
            key: Set(key.to_owned()),
            session: Set(session.to_owned()),
        };

        auth_session::Entity::insert(model)
            .on_conflict(
                OnConflict::column(auth_session::Column::Key)
                    .update_column(auth_session::Column::Session)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn auth_session(&self, key: &str) -> Result<String, StoreError> {
        auth_session::Entity::find_by_id(key.to_owned())
            .one(&self.conn)
            .await?
            .map(|row| row.session)
            .ok_or(StoreError::NotFound)
    }

    pub async fn delete_auth_session(&self, key: &str) -> Result<(), StoreError> {
        auth_session::Entity::delete_by_id(key.to_owned())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn save_auth_state(&self, key: &str, state: &str) -> Result<(), StoreError> {
        let model = auth_state::ActiveModel {
            key: Set(key.to_owned()),
            state: Set(state.to_owned()),
        };

        auth_state::Entity::insert(model)
            .on_conflict(
                OnConflict::column(auth_state::Column::Key)
                    .update_column(auth_state::Column::State)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn auth_state(&self, key: &str) -> Result<String, StoreError> {
        auth_state::Entity::find_by_id(key.to_owned())
            .one(&self.conn)
            .await?
            .map(|row| row.state)
            .ok_or(StoreError::NotFound)
    }

    pub async fn delete_auth_state(&self, key: &str) -> Result<(), StoreError> {
        auth_state::Entity::delete_by_id(key.to_owned())
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}
