//! Schema migrations. Run once against the live database and once against
//! the sandbox database (`DATABASE_URL` selects the target).

pub use sea_orm_migration::prelude::*;

mod m20240401_000001_create_users;
mod m20240401_000002_create_companies;
mod m20240401_000003_create_company_users;
mod m20240401_000004_create_verification_codes;
mod m20240401_000005_create_api_credentials;
mod m20240401_000006_create_personal_access_tokens;
mod m20240401_000007_create_webhook_request_logs;
mod m20240401_000008_create_outbox_events;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240401_000001_create_users::Migration),
            Box::new(m20240401_000002_create_companies::Migration),
            Box::new(m20240401_000003_create_company_users::Migration),
            Box::new(m20240401_000004_create_verification_codes::Migration),
            Box::new(m20240401_000005_create_api_credentials::Migration),
            Box::new(m20240401_000006_create_personal_access_tokens::Migration),
            Box::new(m20240401_000007_create_webhook_request_logs::Migration),
            Box::new(m20240401_000008_create_outbox_events::Migration),
        ]
    }
}
