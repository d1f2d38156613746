use sea_orm::entity::prelude::*;

/// Append-only record of one terminal webhook delivery outcome.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhook_request_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub api_credential_id: Option<Uuid>,
    pub access_token_id: Option<Uuid>,
    pub key: Option<String>,
    pub company_id: Option<Uuid>,
    pub webhook_id: Option<Uuid>,
    pub api_event_id: Option<Uuid>,
    pub method: String,
    pub status_code: i32,
    pub reason_phrase: String,
    /// Transfer time in seconds.
    pub duration: f64,
    pub url: String,
    pub attempt: i64,
    pub response: Option<String>,
    /// `successful` or `failed`.
    pub status: String,
    pub headers: Json,
    pub meta: Json,
    pub sent_at: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
