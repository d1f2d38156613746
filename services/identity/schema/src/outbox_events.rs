use sea_orm::entity::prelude::*;

/// Event handed to the mail/SMS worker: verification code deliveries and
/// account notifications. Written in the same transaction as the rows it
/// describes.
///
/// This service only inserts rows. The delivery worker that drains the table
/// owns the retry columns: it polls unprocessed rows by `next_attempt_at`,
/// bumps `attempts` and `last_error` on each failure, and sets `processed_at`
/// on success or `failed_at` once it gives up.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// e.g. `verification_email`, `verification_sms`, `account_created`.
    pub kind: String,
    /// User the event concerns.
    pub subject_id: Uuid,
    pub payload: Json,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub next_attempt_at: chrono::DateTime<chrono::Utc>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub failed_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
