use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use console_core::serde::to_rfc3339_ms;

use crate::error::IdentityServiceError;
use crate::handlers::extract::RequestSession;
use crate::state::AppState;
use crate::usecase::onboard::{OnboardInput, OnboardUseCase, ShouldOnboardUseCase};
use crate::usecase::verification::{ResendVerificationUseCase, VerifyCodeInput, VerifyCodeUseCase};

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// ── GET /int/v1/onboard/should-onboard ───────────────────────────────────────

#[derive(Serialize)]
pub struct ShouldOnboardResponse {
    pub should_onboard: bool,
}

pub async fn should_onboard(
    State(state): State<AppState>,
    session: RequestSession,
) -> Result<Json<ShouldOnboardResponse>, IdentityServiceError> {
    let usecase = ShouldOnboardUseCase {
        accounts: state.account_repo(session.partition),
    };
    Ok(Json(ShouldOnboardResponse {
        should_onboard: usecase.execute().await?,
    }))
}

// ── POST /int/v1/onboard/create-account ──────────────────────────────────────

// Missing fields deserialize empty so validation reports them by name.
#[derive(Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub organization_name: String,
}

#[derive(Serialize)]
pub struct CreateAccountResponse {
    pub status: &'static str,
    pub session: String,
    pub token: Option<String>,
    #[serde(rename = "skipVerification")]
    pub skip_verification: bool,
}

pub async fn create_account(
    State(state): State<AppState>,
    RequestSession { mut ctx, partition }: RequestSession,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, IdentityServiceError> {
    let usecase = OnboardUseCase {
        accounts: state.account_repo(partition),
        verification: state.verification(partition),
        session: state.session_manager(partition),
    };
    let output = usecase
        .execute(
            &mut ctx,
            OnboardInput {
                name: body.name,
                email: body.email,
                phone: body.phone,
                password: body.password,
                organization_name: body.organization_name,
            },
        )
        .await?;

    Ok(Json(CreateAccountResponse {
        status: "success",
        session: output.session,
        token: output.token.map(|t| t.token),
        skip_verification: output.is_admin,
    }))
}

// ── POST /int/v1/onboard/send-verification-{email,sms} ───────────────────────

#[derive(Deserialize)]
pub struct ResendRequest {
    /// Session reference returned by create-account.
    pub id: String,
}

pub async fn send_verification_email(
    State(state): State<AppState>,
    session: RequestSession,
    Json(body): Json<ResendRequest>,
) -> Result<Json<StatusResponse>, IdentityServiceError> {
    let usecase = ResendVerificationUseCase {
        users: state.user_repo(session.partition),
        verification: state.verification(session.partition),
    };
    usecase.email(&body.id).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}

pub async fn send_verification_sms(
    State(state): State<AppState>,
    session: RequestSession,
    Json(body): Json<ResendRequest>,
) -> Result<Json<StatusResponse>, IdentityServiceError> {
    let usecase = ResendVerificationUseCase {
        users: state.user_repo(session.partition),
        verification: state.verification(session.partition),
    };
    usecase.sms(&body.id).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}

// ── POST /int/v1/onboard/verify-email ────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub session: Option<String>,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub verified_at: DateTime<Utc>,
    pub token: String,
}

pub async fn verify_email(
    State(state): State<AppState>,
    RequestSession { mut ctx, partition }: RequestSession,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, IdentityServiceError> {
    let usecase = VerifyCodeUseCase {
        codes: state.verification_code_repo(partition),
        session: state.session_manager(partition),
    };
    let output = usecase
        .execute(
            &mut ctx,
            VerifyCodeInput {
                session: body.session,
                code: body.code,
            },
        )
        .await?;

    Ok(Json(VerifyResponse {
        status: "ok",
        verified_at: output.verified_at,
        token: output.token.token,
    }))
}
