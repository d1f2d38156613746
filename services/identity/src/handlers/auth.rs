use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use console_core::serde::{opt_to_rfc3339_ms, to_rfc3339_ms};
use console_domain::partition::Partition;

use crate::error::IdentityServiceError;
use crate::handlers::extract::RequestSession;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};

// ── POST /int/v1/auth/login ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    RequestSession { mut ctx, .. }: RequestSession,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, IdentityServiceError> {
    // Issued bearers are authenticated against live, so they are minted there.
    let usecase = LoginUseCase {
        session: state.identity(),
    };
    let token = usecase
        .execute(
            &mut ctx,
            LoginInput {
                email: body.email,
                password: body.password,
            },
        )
        .await?;
    Ok(Json(LoginResponse {
        token: token.token,
        expires_at: token.expires_at,
    }))
}

// ── GET /int/v1/auth/session ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiKeySummary {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub test_mode: bool,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub partition: Partition,
    pub company: Option<Uuid>,
    pub user: Option<Uuid>,
    pub is_admin: bool,
    pub is_sandbox: bool,
    pub sandbox_api_credential: Option<String>,
    pub api_credential: Option<Uuid>,
    pub api_environment: Option<&'static str>,
    #[serde(serialize_with = "opt_to_rfc3339_ms")]
    pub api_key_version: Option<DateTime<Utc>>,
    pub access_token: Option<Uuid>,
    pub api_key: Option<ApiKeySummary>,
}

/// Current session context. Secrets are never echoed back.
pub async fn get_session(
    State(state): State<AppState>,
    RequestSession { ctx, partition }: RequestSession,
) -> Json<SessionResponse> {
    let api_key = state
        .identity()
        .get_api_key(&ctx)
        .await
        .map(|c| ApiKeySummary {
            id: c.id,
            name: c.name,
            key: c.key,
            test_mode: c.test_mode,
        });

    Json(SessionResponse {
        partition,
        company: ctx.company_id,
        user: ctx.user_id,
        is_admin: ctx.is_admin,
        is_sandbox: ctx.is_sandbox,
        sandbox_api_credential: ctx.sandbox_api_credential,
        api_credential: ctx.api_credential_id,
        api_environment: ctx.api_environment.map(|e| e.as_str()),
        api_key_version: ctx.api_key_version,
        access_token: ctx.access_token_id,
        api_key,
    })
}
