use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;

use console_domain::partition::Partition;

use crate::domain::webhook::FinalWebhookCallFailed;
use crate::infra::db::{
    DbAccessTokenRepository, DbAccountRepository, DbApiCredentialRepository, DbUserRepository,
    DbVerificationCodeRepository, DbWebhookLogRepository,
};
use crate::usecase::session::SessionManager;
use crate::usecase::verification::IssueVerificationUseCase;
use crate::usecase::webhook_log::RecordWebhookAttemptUseCase;

pub type DbSessionManager =
    SessionManager<DbUserRepository, DbApiCredentialRepository, DbAccessTokenRepository>;

pub type DbWebhookRecorder = RecordWebhookAttemptUseCase<
    DbApiCredentialRepository,
    DbAccessTokenRepository,
    DbWebhookLogRepository,
>;

/// Both partition connections and nothing else. Background tasks hold this
/// instead of [`AppState`] so they never keep the webhook channel open.
#[derive(Clone)]
pub struct PartitionDatabases {
    pub live: DatabaseConnection,
    pub sandbox: DatabaseConnection,
}

impl PartitionDatabases {
    /// Recorder writing into `partition`; credentials still come from live.
    pub fn webhook_recorder(&self, partition: Partition) -> DbWebhookRecorder {
        let db = match partition {
            Partition::Live => self.live.clone(),
            Partition::Sandbox => self.sandbox.clone(),
        };
        RecordWebhookAttemptUseCase {
            credentials: DbApiCredentialRepository {
                db: self.live.clone(),
            },
            tokens: DbAccessTokenRepository { db: db.clone() },
            logs: DbWebhookLogRepository { db },
        }
    }
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub live_db: DatabaseConnection,
    pub sandbox_db: DatabaseConnection,
    pub jwt_secret: String,
    pub webhook_events: mpsc::Sender<FinalWebhookCallFailed>,
}

impl AppState {
    pub fn databases(&self) -> PartitionDatabases {
        PartitionDatabases {
            live: self.live_db.clone(),
            sandbox: self.sandbox_db.clone(),
        }
    }

    pub fn db(&self, partition: Partition) -> DatabaseConnection {
        match partition {
            Partition::Live => self.live_db.clone(),
            Partition::Sandbox => self.sandbox_db.clone(),
        }
    }

    pub fn user_repo(&self, partition: Partition) -> DbUserRepository {
        DbUserRepository {
            db: self.db(partition),
        }
    }

    pub fn account_repo(&self, partition: Partition) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db(partition),
        }
    }

    pub fn verification_code_repo(&self, partition: Partition) -> DbVerificationCodeRepository {
        DbVerificationCodeRepository {
            db: self.db(partition),
        }
    }

    /// Credentials live in the live partition only.
    pub fn api_credential_repo(&self) -> DbApiCredentialRepository {
        DbApiCredentialRepository {
            db: self.live_db.clone(),
        }
    }

    pub fn access_token_repo(&self, partition: Partition) -> DbAccessTokenRepository {
        DbAccessTokenRepository {
            db: self.db(partition),
        }
    }

    pub fn session_manager(&self, partition: Partition) -> DbSessionManager {
        SessionManager {
            users: self.user_repo(partition),
            credentials: self.api_credential_repo(),
            tokens: self.access_token_repo(partition),
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    /// Session manager for resolving who is calling. Bearer tokens, API
    /// credentials and the users behind them are looked up in live only.
    pub fn identity(&self) -> DbSessionManager {
        self.session_manager(Partition::Live)
    }

    pub fn verification(
        &self,
        partition: Partition,
    ) -> IssueVerificationUseCase<DbVerificationCodeRepository> {
        IssueVerificationUseCase {
            codes: self.verification_code_repo(partition),
        }
    }
}
