use console_auth_types::sandbox::SandboxHeaders;
use console_auth_types::token::looks_like_jwt;
use console_domain::partition::Partition;

use crate::domain::repository::{AccessTokenRepository, ApiCredentialRepository, UserRepository};
use crate::domain::session::{Principal, SessionContext};
use crate::error::IdentityServiceError;
use crate::usecase::sandbox;
use crate::usecase::session::SessionManager;

/// Resolves the caller of one request, then picks the partition it works in.
///
/// `identity` reads from the live partition. Tokens, credentials and their
/// users are resolved there before the sandbox headers are looked at, so a
/// live-issued bearer stays valid on sandbox requests.
pub struct AuthenticateRequestUseCase<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub identity: SessionManager<U, A, T>,
}

impl<U, A, T> AuthenticateRequestUseCase<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    /// Anonymous requests get an empty context. A JWT bearer must name a
    /// live personal access token; anything else is looked up as an API key.
    pub async fn execute(
        &self,
        sandbox_headers: &SandboxHeaders,
        bearer: Option<&str>,
    ) -> Result<(SessionContext, Partition), IdentityServiceError> {
        let mut ctx = SessionContext::default();

        let credential = match bearer {
            Some(token) if looks_like_jwt(token) => {
                self.identity.authenticate_token(&mut ctx, token).await?;
                None
            }
            Some(key) => {
                let credential = self
                    .identity
                    .credentials
                    .find_by_key(key)
                    .await?
                    .ok_or(IdentityServiceError::InvalidToken)?;
                self.identity.establish_api_key(&mut ctx, &credential);
                self.identity
                    .establish(&mut ctx, Principal::ApiCredential(credential.clone()))
                    .await?;
                Some(credential)
            }
            None => None,
        };

        let partition = sandbox::route(sandbox_headers, credential.as_ref(), &mut ctx);
        Ok((ctx, partition))
    }
}
