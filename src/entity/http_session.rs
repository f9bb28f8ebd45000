//! HTTP session entity model for Sea-ORM database interaction.
//!
//! This module defines the database schema representation for the server-side
//! half of the cookie session. The browser only ever holds the signed session
//! id; the record itself lives in the `http_session` table.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing an HTTP session in the database.
///
/// It is used by the [`SqliteSessionStore`](crate::session_store::SqliteSessionStore)
/// and you typically won't need to interact with it directly.
///
/// # Database Schema
///
/// | Column      | Type                    | Description                       |
/// |-------------|-------------------------|-----------------------------------|
/// | id          | TEXT (Primary Key)      | Session ID                        |
/// | data        | BLOB                    | MessagePack serialized record     |
/// | expiry_date | TIMESTAMP WITH TZ       | Session expiration timestamp      |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "http_session")]
pub struct Model {
    /// The session identifier, the string form of `tower_sessions::session::Id`.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// The MessagePack-serialized `tower_sessions::session::Record`.
    pub data: Vec<u8>,

    /// When the session becomes invalid.
    ///
    /// Always written in UTC so that SQLite's text comparison orders the
    /// column chronologically. Rows past this instant are ignored on load and
    /// removed by the periodic cleanup.
    pub expiry_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
