use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use console_domain::user::{MembershipStatus, UserRole, UserStatus};
use console_domain::verification::VerificationPurpose;

use crate::domain::webhook::WebhookOutcome;

/// Console user as seen by the identity service.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub username: String,
    /// Argon2 PHC string; never the plaintext.
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Active company. Always one the user holds a membership for.
    pub company_id: Option<Uuid>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Address for a delivery channel, if the user has one.
    pub fn phone_number(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Tenant organization.
#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership of a user in a company.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
}

/// Everything onboarding writes, persisted in one transaction.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub company: Company,
    pub membership: CompanyUser,
}

/// Single-use verification code.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationCode {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub purpose: VerificationPurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_valid(&self) -> bool {
        self.used_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Machine principal authenticating with a key.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCredential {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub secret: String,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub test_mode: bool,
    pub created_at: DateTime<Utc>,
}

/// Server-side record of a minted access token.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalAccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PersonalAccessToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// One terminal webhook delivery outcome. Written once, never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequestLog {
    pub id: Uuid,
    pub api_credential_id: Option<Uuid>,
    pub access_token_id: Option<Uuid>,
    pub key: Option<String>,
    pub company_id: Option<Uuid>,
    pub webhook_id: Option<Uuid>,
    pub api_event_id: Option<Uuid>,
    pub method: String,
    pub status_code: u16,
    pub reason_phrase: String,
    /// Seconds.
    pub duration: f64,
    pub url: String,
    pub attempt: u32,
    pub response: Option<String>,
    pub status: WebhookOutcome,
    pub headers: serde_json::Value,
    pub meta: serde_json::Value,
    pub sent_at: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outbox event for async delivery (verification codes, account notifications).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub subject_id: Uuid,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

impl OutboxEvent {
    pub fn new(kind: &str, subject_id: Uuid, payload: serde_json::Value) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            kind: kind.to_owned(),
            subject_id,
            payload,
            idempotency_key: format!("{kind}:{id}"),
        }
    }
}

pub const OUTBOX_VERIFICATION_EMAIL: &str = "verification_email";
pub const OUTBOX_VERIFICATION_SMS: &str = "verification_sms";
pub const OUTBOX_ACCOUNT_CREATED: &str = "account_created";

/// Verification code length in digits.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Verification code time-to-live in seconds.
pub const VERIFICATION_CODE_TTL_SECS: i64 = 3600;

/// Random characters appended to the display name when deriving a username.
pub const USERNAME_SUFFIX_LEN: usize = 3;

/// Attempts at finding a free username before onboarding gives up.
pub const MAX_USERNAME_ATTEMPTS: usize = 5;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Loose address check: one `@`, non-empty local part, dotted domain, no spaces.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Lower-case ASCII slug; runs of anything else collapse into `separator`.
pub fn slugify(input: &str, separator: char) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(separator);
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}
