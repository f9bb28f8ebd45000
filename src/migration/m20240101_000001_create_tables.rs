use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Status::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Status::Uri).text().not_null().primary_key())
                    .col(ColumnDef::new(Status::AuthorId).text().not_null())
                    .col(ColumnDef::new(Status::Text).text().not_null())
                    .col(ColumnDef::new(Status::CreatedAt).text().not_null())
                    .col(ColumnDef::new(Status::IndexedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Serves both the per-author lookup and its ordering.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_status_author_indexed")
                    .table(Status::Table)
                    .col(Status::AuthorId)
                    .col(Status::IndexedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuthSession::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuthSession::Key).text().not_null().primary_key())
                    .col(ColumnDef::new(AuthSession::Session).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuthState::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuthState::Key).text().not_null().primary_key())
                    .col(ColumnDef::new(AuthState::State).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpSession::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpSession::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(HttpSession::Data).blob().not_null())
                    .col(
                        ColumnDef::new(HttpSession::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HttpSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Status::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Status {
    Table,
    Uri,
    #[sea_orm(iden = "authorId")]
    AuthorId,
    Text,
    #[sea_orm(iden = "createdAt")]
    CreatedAt,
    #[sea_orm(iden = "indexedAt")]
    IndexedAt,
}

#[derive(DeriveIden)]
enum AuthSession {
    Table,
    Key,
    Session,
}

#[derive(DeriveIden)]
enum AuthState {
    Table,
    Key,
    State,
}

#[derive(DeriveIden)]
enum HttpSession {
    Table,
    Id,
    Data,
    ExpiryDate,
}
