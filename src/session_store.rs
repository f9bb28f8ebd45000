use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use time::OffsetDateTime;
use tower_sessions::{session::Id, session::Record, session_store, ExpiredDeletion, SessionStore};

use crate::entity::http_session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity};

/// The `tower-sessions` backend for statusphere, persisting HTTP sessions in
/// the `http_session` table of the application database.
///
/// The browser holds only the signed session id. Records are serialized with
/// MessagePack and carry their expiry in a dedicated column so expired rows
/// can be skipped on load and swept in bulk.
///
/// # Error Handling
///
/// - Database errors → `session_store::Error::Backend`
/// - Serialization errors → `session_store::Error::Encode`
/// - Deserialization errors → `session_store::Error::Decode`
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    conn: DatabaseConnection,
}

impl SqliteSessionStore {
    /// Creates a session store over an already migrated connection.
    ///
    /// Usually obtained through [`Store::sessions`](crate::store::Store::sessions).
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    /// Inserts a new session record, regenerating the id until it does not
    /// collide with an existing row.
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let txn = self.conn.begin().await.map_err(backend)?;

        while SessionEntity::find_by_id(record.id.to_string())
            .one(&txn)
            .await
            .map_err(backend)?
            .is_some()
        {
            record.id = Id::default();
        }

        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        SessionActiveModel {
            id: Set(record.id.to_string()),
            data: Set(data),
            expiry_date: Set(to_db_datetime(record.expiry_date)),
        }
        .insert(&txn)
        .await
        .map_err(backend)?;

        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    /// Upserts the record under its id.
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data =
            rmp_serde::to_vec(record).map_err(|e| session_store::Error::Encode(e.to_string()))?;

        let model = SessionActiveModel {
            id: Set(record.id.to_string()),
            data: Set(data),
            expiry_date: Set(to_db_datetime(record.expiry_date)),
        };

        SessionEntity::insert(model)
            .on_conflict(
                OnConflict::column(http_session::Column::Id)
                    .update_columns([http_session::Column::Data, http_session::Column::ExpiryDate])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }

    /// Loads a record by id. Expired rows are filtered out in the query, so
    /// they read as `Ok(None)`.
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = to_db_datetime(OffsetDateTime::now_utc());

        let session = SessionEntity::find_by_id(session_id.to_string())
            .filter(http_session::Column::ExpiryDate.gt(now))
            .one(&self.conn)
            .await
            .map_err(backend)?;

        match session {
            Some(model) => {
                let record = rmp_serde::from_slice(&model.data)
                    .map_err(|e| session_store::Error::Decode(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        SessionEntity::delete_by_id(session_id.to_string())
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SqliteSessionStore {
    /// Deletes every row whose expiry date has passed.
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = to_db_datetime(OffsetDateTime::now_utc());

        SessionEntity::delete_many()
            .filter(http_session::Column::ExpiryDate.lt(now))
            .exec(&self.conn)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

fn backend(err: DbErr) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

// Always lands in UTC; instants beyond chrono's range saturate.
fn to_db_datetime(ts: OffsetDateTime) -> DateTimeWithTimeZone {
    DateTime::<Utc>::from_timestamp(ts.unix_timestamp(), ts.nanosecond())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .into()
}
