use chrono::Utc;
use tracing::warn;

use console_auth_types::token::validate_access_token;

use crate::domain::repository::{AccessTokenRepository, ApiCredentialRepository, UserRepository};
use crate::domain::session::{ApiEnvironment, Principal, SessionContext};
use crate::domain::types::{ApiCredential, User};
use crate::error::IdentityServiceError;
use crate::usecase::token::{IssuedToken, mint_token};

/// Populates and reads a [`SessionContext`] for one partition.
///
/// `credentials` must read from the live partition regardless of where the
/// request is routed. `users` and `tokens` come from the partition the
/// manager was built for, which is live whenever it resolves a caller.
pub struct SessionManager<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub users: U,
    pub credentials: A,
    pub tokens: T,
    pub jwt_secret: String,
}

impl<U, A, T> SessionManager<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    /// Fill the identity part of `ctx` for `principal` and return the user it
    /// resolved to, if any.
    pub async fn establish(
        &self,
        ctx: &mut SessionContext,
        principal: Principal,
    ) -> Result<Option<User>, IdentityServiceError> {
        let user = match principal {
            Principal::User(user) => Some(user),
            Principal::ApiCredential(credential) => {
                ctx.company_id = Some(credential.company_id);
                ctx.user_id = credential.user_id;
                match credential.user_id {
                    Some(id) => self.users.find_by_id(id).await?,
                    None => None,
                }
            }
        };

        if let Some(user) = &user {
            ctx.company_id = user.company_id;
            ctx.user_id = Some(user.id);
            ctx.is_admin = user.is_admin();
        }
        Ok(user)
    }

    /// Record which API credential the request authenticated with.
    pub fn establish_api_key(&self, ctx: &mut SessionContext, credential: &ApiCredential) {
        ctx.api_credential_id = Some(credential.id);
        ctx.api_key = Some(credential.key.clone());
        ctx.api_secret = Some(credential.secret.clone());
        ctx.api_key_version = Some(credential.created_at);
        ctx.api_environment = Some(ApiEnvironment::from_test_mode(credential.test_mode));
        ctx.api_test_mode = credential.test_mode;
    }

    /// The credential referenced by the context. Storage faults read as `None`.
    pub async fn get_api_key(&self, ctx: &SessionContext) -> Option<ApiCredential> {
        let id = ctx.api_credential_id?;
        match self.credentials.find_by_id(id).await {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, credential_id = %id, "api credential lookup failed");
                None
            }
        }
    }

    /// Establish the session and mint a personal access token for its user.
    pub async fn login(
        &self,
        ctx: &mut SessionContext,
        principal: Principal,
    ) -> Result<IssuedToken, IdentityServiceError> {
        let user = self
            .establish(ctx, principal)
            .await?
            .ok_or(IdentityServiceError::UserNotFound)?;
        self.users.record_login(user.id, Utc::now()).await?;
        let token = mint_token(&self.tokens, &user, &self.jwt_secret).await?;
        ctx.access_token_id = Some(token.id);
        Ok(token)
    }

    /// Resolve a bearer JWT to its user. The signature, the backing token row
    /// and the user must all check out.
    pub async fn authenticate_token(
        &self,
        ctx: &mut SessionContext,
        token: &str,
    ) -> Result<User, IdentityServiceError> {
        let info = validate_access_token(token, &self.jwt_secret)
            .map_err(|_| IdentityServiceError::InvalidToken)?;

        let record = self
            .tokens
            .find_by_id(info.token_id)
            .await?
            .filter(|t| t.user_id == info.user_id && !t.is_expired())
            .ok_or(IdentityServiceError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(IdentityServiceError::InvalidToken)?;

        ctx.access_token_id = Some(record.id);
        self.establish(ctx, Principal::User(user.clone())).await?;
        Ok(user)
    }
}
