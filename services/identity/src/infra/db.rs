use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, SqlErr, Statement, TransactionError,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use console_domain::user::{UserRole, UserStatus};
use console_domain::verification::VerificationPurpose;
use console_identity_schema::{
    api_credentials, companies, company_users, outbox_events, personal_access_tokens, users,
    verification_codes, webhook_request_logs,
};

use crate::domain::repository::{
    AccessTokenRepository, AccountRepository, ApiCredentialRepository, UserRepository,
    VerificationCodeRepository, WebhookLogRepository,
};
use crate::domain::types::{
    ApiCredential, Company, CompanyUser, NewAccount, OutboxEvent, PersonalAccessToken, User,
    VerificationCode, WebhookRequestLog,
};
use crate::error::IdentityServiceError;

/// Advisory lock key serializing account creation against the bootstrap check.
const BOOTSTRAP_LOCK_KEY: i64 = 0x636f_6e73_6f6c_6501;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn record_verification(
        &self,
        id: Uuid,
        purpose: VerificationPurpose,
        at: DateTime<Utc>,
    ) -> Result<(), IdentityServiceError> {
        let mut model = users::ActiveModel {
            id: Set(id),
            status: Set(UserStatus::Active.as_str().to_owned()),
            updated_at: Set(at),
            ..Default::default()
        };
        match purpose {
            VerificationPurpose::EmailVerification => model.email_verified_at = Set(Some(at)),
            VerificationPurpose::PhoneVerification => model.phone_verified_at = Set(Some(at)),
        }
        model
            .update(&self.db)
            .await
            .context("record user verification")?;
        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), IdentityServiceError> {
        users::ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("record user login")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> Result<User, IdentityServiceError> {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .with_context(|| format!("unknown user role {}", model.role))?;
    let status = model
        .status
        .parse::<UserStatus>()
        .context("decode user status")?;
    Ok(User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        username: model.username,
        password_hash: model.password,
        role,
        status,
        company_id: model.company_id,
        email_verified_at: model.email_verified_at,
        phone_verified_at: model.phone_verified_at,
        last_login_at: model.last_login_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Account repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn any_company_exists(&self) -> Result<bool, IdentityServiceError> {
        let first = companies::Entity::find()
            .one(&self.db)
            .await
            .context("check for existing company")?;
        Ok(first.is_some())
    }

    async fn create_account(
        &self,
        account: &NewAccount,
        event: &OutboxEvent,
    ) -> Result<UserRole, IdentityServiceError> {
        self.db
            .transaction::<_, UserRole, DbErr>(|txn| {
                let account = account.clone();
                let event = event.clone();
                Box::pin(async move {
                    // Held until commit; concurrent signups queue here, so only
                    // one of them can find the installation empty.
                    txn.execute(Statement::from_sql_and_values(
                        txn.get_database_backend(),
                        "SELECT pg_advisory_xact_lock($1)",
                        [BOOTSTRAP_LOCK_KEY.into()],
                    ))
                    .await?;
                    let role = match companies::Entity::find().one(txn).await? {
                        Some(_) => UserRole::User,
                        None => UserRole::Admin,
                    };

                    let user = User {
                        role,
                        ..account.user
                    };
                    insert_user(txn, &user).await?;
                    insert_company(txn, &account.company).await?;
                    insert_membership(txn, &account.membership).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(role)
                })
            })
            .await
            .map_err(account_write_error)
    }
}

/// Unique violations on `users` become domain errors the caller can act on.
fn account_write_error(err: TransactionError<DbErr>) -> IdentityServiceError {
    let db_err = match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => e,
    };
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = db_err.sql_err() {
        if detail.contains("username") {
            return IdentityServiceError::UsernameTaken;
        }
        if detail.contains("email") {
            return IdentityServiceError::EmailAlreadyExists;
        }
    }
    IdentityServiceError::Internal(anyhow::Error::new(db_err).context("create account"))
}

async fn insert_user(txn: &DatabaseTransaction, user: &User) -> Result<(), DbErr> {
    users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        phone: Set(user.phone.clone()),
        username: Set(user.username.clone()),
        password: Set(user.password_hash.clone()),
        role: Set(i16::from(user.role.as_u8())),
        status: Set(user.status.as_str().to_owned()),
        company_id: Set(user.company_id),
        email_verified_at: Set(user.email_verified_at),
        phone_verified_at: Set(user.phone_verified_at),
        last_login_at: Set(user.last_login_at),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_company(txn: &DatabaseTransaction, company: &Company) -> Result<(), DbErr> {
    companies::ActiveModel {
        id: Set(company.id),
        name: Set(company.name.clone()),
        owner_id: Set(company.owner_id),
        created_at: Set(company.created_at),
        updated_at: Set(company.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_membership(
    txn: &DatabaseTransaction,
    membership: &CompanyUser,
) -> Result<(), DbErr> {
    company_users::ActiveModel {
        id: Set(membership.id),
        user_id: Set(membership.user_id),
        company_id: Set(membership.company_id),
        status: Set(membership.status.as_str().to_owned()),
        created_at: Set(membership.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(txn: &DatabaseTransaction, event: &OutboxEvent) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        subject_id: Set(event.subject_id),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

// ── Verification code repository ─────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationCodeRepository {
    pub db: DatabaseConnection,
}

impl VerificationCodeRepository for DbVerificationCodeRepository {
    async fn create_with_outbox(
        &self,
        code: &VerificationCode,
        event: &OutboxEvent,
    ) -> Result<(), IdentityServiceError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let code = code.clone();
                let event = event.clone();
                Box::pin(async move {
                    insert_verification_code(txn, &code).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("create verification code with outbox")?;
        Ok(())
    }

    async fn find_valid(
        &self,
        subject_id: Uuid,
        purpose: VerificationPurpose,
        code: &str,
    ) -> Result<Option<VerificationCode>, IdentityServiceError> {
        let now = Utc::now();
        let model = verification_codes::Entity::find()
            .filter(verification_codes::Column::SubjectId.eq(subject_id))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(verification_codes::Column::Code.eq(code))
            .filter(verification_codes::Column::UsedAt.is_null())
            .filter(verification_codes::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find valid verification code")?;
        model.map(verification_code_from_model).transpose()
    }

    async fn consume(&self, id: Uuid) -> Result<bool, IdentityServiceError> {
        let result = verification_codes::Entity::update_many()
            .col_expr(verification_codes::Column::UsedAt, Expr::value(Utc::now()))
            .filter(verification_codes::Column::Id.eq(id))
            .filter(verification_codes::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume verification code")?;
        Ok(result.rows_affected == 1)
    }
}

async fn insert_verification_code(
    txn: &DatabaseTransaction,
    code: &VerificationCode,
) -> Result<(), DbErr> {
    verification_codes::ActiveModel {
        id: Set(code.id),
        subject_id: Set(code.subject_id),
        purpose: Set(code.purpose.as_str().to_owned()),
        code: Set(code.code.clone()),
        expires_at: Set(code.expires_at),
        used_at: Set(None),
        created_at: Set(code.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn verification_code_from_model(
    model: verification_codes::Model,
) -> Result<VerificationCode, IdentityServiceError> {
    let purpose = model
        .purpose
        .parse::<VerificationPurpose>()
        .context("decode verification purpose")?;
    Ok(VerificationCode {
        id: model.id,
        subject_id: model.subject_id,
        purpose,
        code: model.code,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    })
}

// ── API credential repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbApiCredentialRepository {
    pub db: DatabaseConnection,
}

impl ApiCredentialRepository for DbApiCredentialRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ApiCredential>, IdentityServiceError> {
        let model = api_credentials::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find api credential by id")?;
        Ok(model.map(api_credential_from_model))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ApiCredential>, IdentityServiceError> {
        let model = api_credentials::Entity::find()
            .filter(api_credentials::Column::Key.eq(key))
            .one(&self.db)
            .await
            .context("find api credential by key")?;
        Ok(model.map(api_credential_from_model))
    }
}

fn api_credential_from_model(model: api_credentials::Model) -> ApiCredential {
    ApiCredential {
        id: model.id,
        name: model.name,
        key: model.key,
        secret: model.secret,
        company_id: model.company_id,
        user_id: model.user_id,
        test_mode: model.test_mode,
        created_at: model.created_at,
    }
}

// ── Access token repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccessTokenRepository {
    pub db: DatabaseConnection,
}

impl AccessTokenRepository for DbAccessTokenRepository {
    async fn create(&self, token: &PersonalAccessToken) -> Result<(), IdentityServiceError> {
        personal_access_tokens::ActiveModel {
            id: Set(token.id),
            user_id: Set(token.user_id),
            name: Set(token.name.clone()),
            created_at: Set(token.created_at),
            expires_at: Set(token.expires_at),
        }
        .insert(&self.db)
        .await
        .context("create personal access token")?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PersonalAccessToken>, IdentityServiceError> {
        let model = personal_access_tokens::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find personal access token")?;
        Ok(model.map(|m| PersonalAccessToken {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }))
    }
}

// ── Webhook log repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbWebhookLogRepository {
    pub db: DatabaseConnection,
}

impl WebhookLogRepository for DbWebhookLogRepository {
    async fn insert(&self, log: &WebhookRequestLog) -> Result<(), IdentityServiceError> {
        webhook_log_model(log)
            .insert(&self.db)
            .await
            .context("insert webhook request log")?;
        Ok(())
    }
}

fn webhook_log_model(log: &WebhookRequestLog) -> webhook_request_logs::ActiveModel {
    webhook_request_logs::ActiveModel {
        id: Set(log.id),
        api_credential_id: Set(log.api_credential_id),
        access_token_id: Set(log.access_token_id),
        key: Set(log.key.clone()),
        company_id: Set(log.company_id),
        webhook_id: Set(log.webhook_id),
        api_event_id: Set(log.api_event_id),
        method: Set(log.method.clone()),
        status_code: Set(i32::from(log.status_code)),
        reason_phrase: Set(log.reason_phrase.clone()),
        duration: Set(log.duration),
        url: Set(log.url.clone()),
        attempt: Set(i64::from(log.attempt)),
        response: Set(log.response.clone()),
        status: Set(log.status.as_str().to_owned()),
        headers: Set(log.headers.clone()),
        meta: Set(log.meta.clone()),
        sent_at: Set(log.sent_at.clone()),
        created_at: Set(log.created_at),
    }
}
