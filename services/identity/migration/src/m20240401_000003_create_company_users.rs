use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CompanyUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyUsers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CompanyUsers::UserId).uuid().not_null())
                    .col(ColumnDef::new(CompanyUsers::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(CompanyUsers::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(CompanyUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CompanyUsers::Table, CompanyUsers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CompanyUsers::Table, CompanyUsers::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(CompanyUsers::Table)
                    .col(CompanyUsers::UserId)
                    .col(CompanyUsers::CompanyId)
                    .unique()
                    .name("idx_company_users_user_company")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyUsers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CompanyUsers {
    Table,
    Id,
    UserId,
    CompanyId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Companies {
    Table,
    Id,
}
