use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiCredentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ApiCredentials::Name).string().not_null())
                    .col(
                        ColumnDef::new(ApiCredentials::Key)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ApiCredentials::Secret).string().not_null())
                    .col(ColumnDef::new(ApiCredentials::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(ApiCredentials::UserId).uuid())
                    .col(
                        ColumnDef::new(ApiCredentials::TestMode)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ApiCredentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiCredentials::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApiCredentials {
    Table,
    Id,
    Name,
    Key,
    Secret,
    CompanyId,
    UserId,
    TestMode,
    CreatedAt,
}
