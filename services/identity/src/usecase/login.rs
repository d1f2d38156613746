use crate::domain::repository::{AccessTokenRepository, ApiCredentialRepository, UserRepository};
use crate::domain::session::{Principal, SessionContext};
use crate::error::IdentityServiceError;
use crate::usecase::password::verify_password;
use crate::usecase::session::SessionManager;
use crate::usecase::token::IssuedToken;

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Password login for console users.
pub struct LoginUseCase<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub session: SessionManager<U, A, T>,
}

impl<U, A, T> LoginUseCase<U, A, T>
where
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub async fn execute(
        &self,
        ctx: &mut SessionContext,
        input: LoginInput,
    ) -> Result<IssuedToken, IdentityServiceError> {
        // Unknown e-mail and wrong password are indistinguishable to the caller.
        let user = self
            .session
            .users
            .find_by_email(&input.email)
            .await?
            .filter(|u| verify_password(&input.password, &u.password_hash))
            .ok_or(IdentityServiceError::InvalidCredentials)?;

        self.session.login(ctx, Principal::User(user)).await
    }
}
