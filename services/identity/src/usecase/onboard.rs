use chrono::Utc;
use rand::RngExt;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use console_domain::user::{MembershipStatus, UserRole, UserStatus};

use crate::domain::repository::{
    AccessTokenRepository, AccountRepository, ApiCredentialRepository, UserRepository,
    VerificationCodeRepository,
};
use crate::domain::session::{Principal, SessionContext};
use crate::domain::types::{
    Company, CompanyUser, MAX_USERNAME_ATTEMPTS, MIN_PASSWORD_LEN, NewAccount,
    OUTBOX_ACCOUNT_CREATED, OutboxEvent, USERNAME_SUFFIX_LEN, User, slugify, validate_email,
};
use crate::error::IdentityServiceError;
use crate::usecase::password::hash_password;
use crate::usecase::session::SessionManager;
use crate::usecase::token::IssuedToken;
use crate::usecase::verification::{
    DeliveryOutcome, IssueVerificationUseCase, encode_session_reference,
};

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Display name slug plus a short random suffix, e.g. `ada_k3x`.
pub fn generate_username(name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..USERNAME_SUFFIX_LEN)
        .map(|_| ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
        .collect();
    slugify(&format!("{name} {suffix}"), '_')
}

#[derive(Debug, Clone)]
pub struct OnboardInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub organization_name: String,
}

#[derive(Debug)]
pub struct OnboardOutput {
    pub user: User,
    pub company: Company,
    pub is_admin: bool,
    /// Base64 reference the browser passes back when verifying.
    pub session: String,
    /// Only the bootstrap admin is signed in right away.
    pub token: Option<IssuedToken>,
    pub delivery: DeliveryOutcome,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, IdentityServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentityServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Check the request shape before touching storage.
pub fn validate_onboard_input(input: &OnboardInput) -> Result<(), IdentityServiceError> {
    required("name", &input.name)?;
    required("organization_name", &input.organization_name)?;
    let email = required("email", &input.email)?;
    if !validate_email(email) {
        return Err(IdentityServiceError::Validation("email is invalid".into()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(IdentityServiceError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Whether the installation still needs its first account.
pub struct ShouldOnboardUseCase<R>
where
    R: AccountRepository,
{
    pub accounts: R,
}

impl<R> ShouldOnboardUseCase<R>
where
    R: AccountRepository,
{
    pub async fn execute(&self) -> Result<bool, IdentityServiceError> {
        Ok(!self.accounts.any_company_exists().await?)
    }
}

/// Creates a user with their own company and starts verification.
pub struct OnboardUseCase<R, C, U, A, T>
where
    R: AccountRepository,
    C: VerificationCodeRepository,
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub accounts: R,
    pub verification: IssueVerificationUseCase<C>,
    pub session: SessionManager<U, A, T>,
}

impl<R, C, U, A, T> OnboardUseCase<R, C, U, A, T>
where
    R: AccountRepository,
    C: VerificationCodeRepository,
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub async fn execute(
        &self,
        ctx: &mut SessionContext,
        input: OnboardInput,
    ) -> Result<OnboardOutput, IdentityServiceError> {
        // 1. Validate → 400 / 409
        validate_onboard_input(&input)?;
        let email = input.email.trim().to_lowercase();
        if self.session.users.find_by_email(&email).await?.is_some() {
            return Err(IdentityServiceError::EmailAlreadyExists);
        }

        // 2-5. User, company and membership, written together. The first
        // company on the installation makes its creator the admin; that is
        // decided inside the write so two signups cannot both claim it.
        let account = self.create_account(&input, email).await?;
        let NewAccount { user, company, .. } = account;
        let is_admin = user.is_admin();
        info!(user_id = %user.id, company_id = %company.id, is_admin, "account created");

        // 6. Verification code, e-mail first then SMS
        let delivery = self.verification.deliver_with_fallback(&user).await;
        match &delivery {
            DeliveryOutcome::NotDelivered { errors } => {
                warn!(user_id = %user.id, ?errors, "verification code not delivered");
            }
            DeliveryOutcome::FellBack { primary_error, .. } => {
                warn!(user_id = %user.id, %primary_error, "verification fell back to sms");
            }
            DeliveryOutcome::Delivered(_) => {}
        }

        // 8. Token for the bootstrap admin only. The account is committed by
        // now, so a failed sign-in leaves the caller to log in afterwards.
        let token = if is_admin {
            let anonymous = ctx.clone();
            match self.session.login(ctx, Principal::User(user.clone())).await {
                Ok(token) => Some(token),
                Err(e) => {
                    *ctx = anonymous;
                    warn!(user_id = %user.id, error = ?e, "bootstrap sign-in failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(OnboardOutput {
            session: encode_session_reference(user.id),
            user,
            company,
            is_admin,
            token,
            delivery,
        })
    }

    async fn create_account(
        &self,
        input: &OnboardInput,
        email: String,
    ) -> Result<NewAccount, IdentityServiceError> {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let name = input.name.trim().to_owned();

        let mut account = NewAccount {
            user: User {
                id: user_id,
                name: name.clone(),
                email,
                phone: input
                    .phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_owned),
                username: generate_username(&name),
                password_hash: hash_password(&input.password)?,
                role: UserRole::User,
                status: UserStatus::Active,
                company_id: Some(company_id),
                email_verified_at: None,
                phone_verified_at: None,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            },
            company: Company {
                id: company_id,
                name: input.organization_name.trim().to_owned(),
                owner_id: user_id,
                created_at: now,
                updated_at: now,
            },
            membership: CompanyUser {
                id: Uuid::new_v4(),
                user_id,
                company_id,
                status: MembershipStatus::Active,
                created_at: now,
            },
        };

        // 7. Account notification rides in the same transaction
        let event = OutboxEvent::new(
            OUTBOX_ACCOUNT_CREATED,
            user_id,
            json!({
                "user_id": user_id,
                "company_id": company_id,
                "name": account.user.name,
                "email": account.user.email,
            }),
        );

        for attempt in 1..=MAX_USERNAME_ATTEMPTS {
            match self.accounts.create_account(&account, &event).await {
                Ok(role) => {
                    account.user.role = role;
                    return Ok(account);
                }
                Err(IdentityServiceError::UsernameTaken) => {
                    warn!(attempt, username = %account.user.username, "username taken, regenerating");
                    account.user.username = generate_username(&name);
                }
                Err(e) => return Err(e),
            }
        }
        Err(IdentityServiceError::Internal(anyhow::anyhow!(
            "no free username after {MAX_USERNAME_ATTEMPTS} attempts"
        )))
    }
}
