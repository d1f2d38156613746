use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use console_auth_types::token::{ACCESS_TOKEN_EXP, JwtClaims};

use crate::domain::repository::AccessTokenRepository;
use crate::domain::types::{PersonalAccessToken, User};
use crate::error::IdentityServiceError;

/// Name recorded on tokens minted by a login.
pub const LOGIN_TOKEN_NAME: &str = "console-login";

/// A freshly minted bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Personal access token row id; also the JWT `jti`.
    pub id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_access_token(
    user: &User,
    token_id: Uuid,
    expires_at: DateTime<Utc>,
    secret: &str,
) -> Result<String, IdentityServiceError> {
    let claims = JwtClaims {
        sub: user.id.to_string(),
        role: user.role.as_u8(),
        jti: token_id.to_string(),
        exp: expires_at.timestamp().max(0) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IdentityServiceError::Internal(e.into()))
}

/// Persist a personal access token row for `user` and sign a JWT naming it.
pub async fn mint_token<T>(
    tokens: &T,
    user: &User,
    secret: &str,
) -> Result<IssuedToken, IdentityServiceError>
where
    T: AccessTokenRepository,
{
    let now = Utc::now();
    let record = PersonalAccessToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        name: LOGIN_TOKEN_NAME.to_owned(),
        created_at: now,
        expires_at: now + Duration::seconds(ACCESS_TOKEN_EXP as i64),
    };
    let token = issue_access_token(user, record.id, record.expires_at, secret)?;
    tokens.create(&record).await?;
    Ok(IssuedToken {
        id: record.id,
        token,
        expires_at: record.expires_at,
    })
}
