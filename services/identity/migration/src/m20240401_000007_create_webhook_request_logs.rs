use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebhookRequestLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookRequestLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookRequestLogs::ApiCredentialId).uuid())
                    .col(ColumnDef::new(WebhookRequestLogs::AccessTokenId).uuid())
                    .col(ColumnDef::new(WebhookRequestLogs::Key).string())
                    .col(ColumnDef::new(WebhookRequestLogs::CompanyId).uuid())
                    .col(ColumnDef::new(WebhookRequestLogs::WebhookId).uuid())
                    .col(ColumnDef::new(WebhookRequestLogs::ApiEventId).uuid())
                    .col(ColumnDef::new(WebhookRequestLogs::Method).string().not_null())
                    .col(
                        ColumnDef::new(WebhookRequestLogs::StatusCode)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebhookRequestLogs::ReasonPhrase)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WebhookRequestLogs::Duration).double().not_null())
                    .col(ColumnDef::new(WebhookRequestLogs::Url).text().not_null())
                    .col(ColumnDef::new(WebhookRequestLogs::Attempt).big_integer().not_null())
                    .col(ColumnDef::new(WebhookRequestLogs::Response).text())
                    .col(ColumnDef::new(WebhookRequestLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(WebhookRequestLogs::Headers)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WebhookRequestLogs::Meta)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WebhookRequestLogs::SentAt).string())
                    .col(
                        ColumnDef::new(WebhookRequestLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(WebhookRequestLogs::Table)
                    .col(WebhookRequestLogs::WebhookId)
                    .name("idx_webhook_request_logs_webhook_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebhookRequestLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WebhookRequestLogs {
    Table,
    Id,
    ApiCredentialId,
    AccessTokenId,
    Key,
    CompanyId,
    WebhookId,
    ApiEventId,
    Method,
    StatusCode,
    ReasonPhrase,
    Duration,
    Url,
    Attempt,
    Response,
    Status,
    Headers,
    Meta,
    SentAt,
    CreatedAt,
}
