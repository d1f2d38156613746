#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use console_domain::user::UserRole;
use console_domain::verification::VerificationPurpose;

use crate::domain::types::{
    ApiCredential, NewAccount, OutboxEvent, PersonalAccessToken, User, VerificationCode,
    WebhookRequestLog,
};
use crate::error::IdentityServiceError;

/// Repository for console users within one partition.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityServiceError>;

    /// Lookup by e-mail, case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityServiceError>;

    /// Stamp the verified-at column for `purpose` and activate the user.
    async fn record_verification(
        &self,
        id: Uuid,
        purpose: VerificationPurpose,
        at: DateTime<Utc>,
    ) -> Result<(), IdentityServiceError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), IdentityServiceError>;
}

/// Companies and the onboarding write path.
pub trait AccountRepository: Send + Sync {
    async fn any_company_exists(&self) -> Result<bool, IdentityServiceError>;

    /// Insert user, company, membership and the notification event in one transaction.
    ///
    /// The role on `account.user` is ignored. The user is stored as admin iff
    /// no company existed when the transaction took the bootstrap lock, and
    /// that role is returned. Concurrent calls serialize on the lock, so at
    /// most one of them can see an empty installation.
    ///
    /// Returns `UsernameTaken` / `EmailAlreadyExists` on the matching unique
    /// index so the caller can react; nothing is written in that case.
    async fn create_account(
        &self,
        account: &NewAccount,
        event: &OutboxEvent,
    ) -> Result<UserRole, IdentityServiceError>;
}

/// Repository for single-use verification codes.
pub trait VerificationCodeRepository: Send + Sync {
    /// Insert a new code and its delivery outbox event atomically (same transaction).
    async fn create_with_outbox(
        &self,
        code: &VerificationCode,
        event: &OutboxEvent,
    ) -> Result<(), IdentityServiceError>;

    /// Find a valid (unused, unexpired) code by subject + purpose + code string.
    async fn find_valid(
        &self,
        subject_id: Uuid,
        purpose: VerificationPurpose,
        code: &str,
    ) -> Result<Option<VerificationCode>, IdentityServiceError>;

    /// Mark a code used if it still is unused. Returns `false` when another
    /// request consumed it first.
    async fn consume(&self, id: Uuid) -> Result<bool, IdentityServiceError>;
}

/// API credentials. Always read from the live partition.
pub trait ApiCredentialRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiCredential>, IdentityServiceError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiCredential>, IdentityServiceError>;
}

/// Server-side records of minted access tokens.
pub trait AccessTokenRepository: Send + Sync {
    async fn create(&self, token: &PersonalAccessToken) -> Result<(), IdentityServiceError>;

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PersonalAccessToken>, IdentityServiceError>;
}

/// Append-only webhook request log.
pub trait WebhookLogRepository: Send + Sync {
    async fn insert(&self, log: &WebhookRequestLog) -> Result<(), IdentityServiceError>;
}
