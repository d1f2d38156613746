use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{ApiCredential, User};

/// Request-scoped authentication context.
///
/// Built fresh by the request extractor and threaded explicitly into the
/// operations that need it. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub company_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub is_admin: bool,
    pub is_sandbox: bool,
    /// Credential a sandbox request acts for, as sent by the caller.
    pub sandbox_api_credential: Option<String>,
    pub api_credential_id: Option<Uuid>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Credential creation time; rotating a key changes it.
    pub api_key_version: Option<DateTime<Utc>>,
    pub api_environment: Option<ApiEnvironment>,
    pub api_test_mode: bool,
    /// Personal access token the request authenticated with (or was issued).
    pub access_token_id: Option<Uuid>,
}

/// Environment an API credential operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEnvironment {
    Live,
    Test,
}

impl ApiEnvironment {
    pub fn from_test_mode(test_mode: bool) -> Self {
        if test_mode { Self::Test } else { Self::Live }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
        }
    }
}

/// Who a session is being established for.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    ApiCredential(ApiCredential),
}
