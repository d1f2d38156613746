use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use console_domain::verification::{DeliveryChannel, VerificationPurpose};

use crate::domain::repository::{
    AccessTokenRepository, ApiCredentialRepository, UserRepository, VerificationCodeRepository,
};
use crate::domain::session::{Principal, SessionContext};
use crate::domain::types::{
    OUTBOX_VERIFICATION_EMAIL, OUTBOX_VERIFICATION_SMS, OutboxEvent, User,
    VERIFICATION_CODE_LEN, VERIFICATION_CODE_TTL_SECS, VerificationCode,
};
use crate::error::IdentityServiceError;
use crate::usecase::session::SessionManager;
use crate::usecase::token::IssuedToken;

const DIGITS: &[u8] = b"0123456789";

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..VERIFICATION_CODE_LEN)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

/// Opaque reference to a user handed to the browser between onboarding steps.
pub fn encode_session_reference(user_id: Uuid) -> String {
    STANDARD.encode(user_id.to_string())
}

pub fn decode_session_reference(reference: &str) -> Option<Uuid> {
    let bytes = STANDARD.decode(reference.trim()).ok()?;
    std::str::from_utf8(&bytes).ok()?.parse().ok()
}

/// Subject of a verification attempt: a raw UUID, else a base64 session
/// reference, else whoever the request is already signed in as.
pub fn resolve_subject(session: Option<&str>, ambient_user: Option<Uuid>) -> Option<Uuid> {
    session
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Uuid>().ok().or_else(|| decode_session_reference(s)))
        .or(ambient_user)
}

/// How a verification code reached (or failed to reach) the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered(DeliveryChannel),
    /// The primary channel failed and the fallback succeeded.
    FellBack {
        channel: DeliveryChannel,
        primary_error: String,
    },
    /// Every channel failed; one message per channel attempted.
    NotDelivered { errors: Vec<String> },
}

impl DeliveryOutcome {
    pub fn channel(&self) -> Option<DeliveryChannel> {
        match self {
            Self::Delivered(channel) | Self::FellBack { channel, .. } => Some(*channel),
            Self::NotDelivered { .. } => None,
        }
    }
}

/// Issues verification codes and queues them for delivery.
pub struct IssueVerificationUseCase<C>
where
    C: VerificationCodeRepository,
{
    pub codes: C,
}

impl<C> IssueVerificationUseCase<C>
where
    C: VerificationCodeRepository,
{
    pub async fn issue_email(&self, user: &User) -> Result<VerificationCode, IdentityServiceError> {
        self.issue(user, DeliveryChannel::Email).await
    }

    pub async fn issue_sms(&self, user: &User) -> Result<VerificationCode, IdentityServiceError> {
        self.issue(user, DeliveryChannel::Sms).await
    }

    pub async fn issue(
        &self,
        user: &User,
        channel: DeliveryChannel,
    ) -> Result<VerificationCode, IdentityServiceError> {
        let (kind, address, missing) = match channel {
            DeliveryChannel::Email => (
                OUTBOX_VERIFICATION_EMAIL,
                Some(user.email.as_str()),
                "user has no email address",
            ),
            DeliveryChannel::Sms => (
                OUTBOX_VERIFICATION_SMS,
                user.phone_number(),
                "user has no phone number",
            ),
        };
        let address = address
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| IdentityServiceError::Delivery(missing.to_owned()))?;

        let now = Utc::now();
        let code = VerificationCode {
            id: Uuid::new_v4(),
            subject_id: user.id,
            purpose: channel.purpose(),
            code: generate_code(),
            expires_at: now + Duration::seconds(VERIFICATION_CODE_TTL_SECS),
            used_at: None,
            created_at: now,
        };
        let event = OutboxEvent::new(
            kind,
            user.id,
            json!({
                "to": address,
                "name": user.name,
                "code": code.code,
                "expires_at": code.expires_at,
            }),
        );

        self.codes
            .create_with_outbox(&code, &event)
            .await
            .map_err(|e| {
                warn!(error = ?e, channel = %channel, user_id = %user.id, "verification write failed");
                IdentityServiceError::Delivery(format!("{channel} channel unavailable"))
            })?;
        Ok(code)
    }

    /// E-mail first, then SMS when the user has a phone number.
    pub async fn deliver_with_fallback(&self, user: &User) -> DeliveryOutcome {
        let primary_error = match self.issue_email(user).await {
            Ok(_) => return DeliveryOutcome::Delivered(DeliveryChannel::Email),
            Err(e) => e.to_string(),
        };

        if user.phone_number().is_none() {
            return DeliveryOutcome::NotDelivered {
                errors: vec![primary_error],
            };
        }

        match self.issue_sms(user).await {
            Ok(_) => DeliveryOutcome::FellBack {
                channel: DeliveryChannel::Sms,
                primary_error,
            },
            Err(e) => DeliveryOutcome::NotDelivered {
                errors: vec![primary_error, e.to_string()],
            },
        }
    }
}

pub struct VerifyCodeInput {
    pub session: Option<String>,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyCodeOutput {
    pub user_id: Uuid,
    pub purpose: VerificationPurpose,
    pub verified_at: DateTime<Utc>,
    pub token: IssuedToken,
}

/// Checks a submitted code, marks the user verified and signs them in.
pub struct VerifyCodeUseCase<C, U, A, T>
where
    C: VerificationCodeRepository,
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub codes: C,
    pub session: SessionManager<U, A, T>,
}

impl<C, U, A, T> VerifyCodeUseCase<C, U, A, T>
where
    C: VerificationCodeRepository,
    U: UserRepository,
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
{
    pub async fn execute(
        &self,
        ctx: &mut SessionContext,
        input: VerifyCodeInput,
    ) -> Result<VerifyCodeOutput, IdentityServiceError> {
        let subject_id = resolve_subject(input.session.as_deref(), ctx.user_id)
            .ok_or(IdentityServiceError::SessionNotFound)?;
        let code = input.code.trim();

        let mut matched = None;
        for purpose in VerificationPurpose::LOOKUP_ORDER {
            if let Some(found) = self.codes.find_valid(subject_id, purpose, code).await? {
                matched = Some(found);
                break;
            }
        }
        let matched = matched.ok_or(IdentityServiceError::InvalidCode)?;

        let user = self
            .session
            .users
            .find_by_id(subject_id)
            .await?
            .ok_or(IdentityServiceError::UserNotFound)?;

        if !self.codes.consume(matched.id).await? {
            return Err(IdentityServiceError::InvalidCode);
        }

        let verified_at = Utc::now();
        self.session
            .users
            .record_verification(user.id, matched.purpose, verified_at)
            .await?;

        let user_id = user.id;
        let token = self.session.login(ctx, Principal::User(user)).await?;

        Ok(VerifyCodeOutput {
            user_id,
            purpose: matched.purpose,
            verified_at,
            token,
        })
    }
}

/// Re-send a code to a user named by a session reference.
pub struct ResendVerificationUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository,
{
    pub users: U,
    pub verification: IssueVerificationUseCase<C>,
}

impl<U, C> ResendVerificationUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository,
{
    async fn find_user(&self, reference: &str) -> Result<Option<User>, IdentityServiceError> {
        match decode_session_reference(reference) {
            Some(id) => self.users.find_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Unknown references are reported as `UserNotFound`.
    pub async fn email(&self, reference: &str) -> Result<(), IdentityServiceError> {
        let user = self
            .find_user(reference)
            .await?
            .ok_or(IdentityServiceError::UserNotFound)?;
        self.verification.issue_email(&user).await?;
        Ok(())
    }

    /// Unknown references are a silent no-op.
    pub async fn sms(&self, reference: &str) -> Result<(), IdentityServiceError> {
        if let Some(user) = self.find_user(reference).await? {
            self.verification.issue_sms(&user).await?;
        }
        Ok(())
    }
}
