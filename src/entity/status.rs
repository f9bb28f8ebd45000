//! Status entity model.
//!
//! One row per record URI.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing one status record.
///
/// # Database Schema
///
/// | Column    | Type               | Description                              |
/// |-----------|--------------------|------------------------------------------|
/// | uri       | TEXT (Primary Key) | `at://{author}/xyz.statusphere.status/…` |
/// | authorId  | TEXT               | Identity reference of the author         |
/// | text      | TEXT               | User supplied status content             |
/// | createdAt | TEXT               | ISO-8601, fixed width, UTC               |
/// | indexedAt | TEXT               | ISO-8601, fixed width, UTC               |
///
/// Timestamps are stored as text and compared lexicographically, so they must
/// always be produced by [`crate::record::iso8601`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "status")]
pub struct Model {
    /// Record URI, unique per author and record key.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub uri: String,

    #[sea_orm(column_name = "authorId", column_type = "Text")]
    pub author_id: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    #[sea_orm(column_name = "createdAt", column_type = "Text")]
    pub created_at: String,

    /// Last time this record was written. Upserts refresh it; `createdAt` is
    /// left untouched.
    #[sea_orm(column_name = "indexedAt", column_type = "Text")]
    pub indexed_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
