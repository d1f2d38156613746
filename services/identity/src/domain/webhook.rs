//! Terminal webhook delivery outcome, as handed over by the delivery subsystem.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use console_domain::partition::Partition;

/// Status code recorded when the endpoint never produced a response.
pub const NO_RESPONSE_STATUS: u16 = 500;

/// Reason phrase recorded when the endpoint never produced a response.
pub const NO_RESPONSE_REASON: &str = "ERR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub status_code: u16,
    #[serde(default)]
    pub reason_phrase: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStats {
    /// Seconds spent on the final attempt.
    #[serde(default)]
    pub transfer_time: f64,
}

/// Emitted once per webhook call after its last attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalWebhookCallFailed {
    #[serde(default)]
    pub response: Option<WebhookResponse>,
    #[serde(default)]
    pub transfer_stats: TransferStats,
    pub http_verb: String,
    pub webhook_url: String,
    pub attempt: u32,
    #[serde(default)]
    pub headers: Value,
    #[serde(default)]
    pub meta: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Successful,
    Failed,
}

impl WebhookOutcome {
    /// Any 2xx code counts as delivered.
    pub fn from_status_code(status_code: u16) -> Self {
        if status_code.to_string().starts_with('2') {
            Self::Successful
        } else {
            Self::Failed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

impl FinalWebhookCallFailed {
    pub fn status_code(&self) -> u16 {
        self.response
            .as_ref()
            .map_or(NO_RESPONSE_STATUS, |r| r.status_code)
    }

    pub fn reason_phrase(&self) -> &str {
        self.response
            .as_ref()
            .map_or(NO_RESPONSE_REASON, |r| r.reason_phrase.as_str())
    }

    pub fn outcome(&self) -> WebhookOutcome {
        WebhookOutcome::from_status_code(self.status_code())
    }

    /// Partition the originating call ran in, from `meta.is_sandbox`.
    pub fn partition(&self) -> Partition {
        Partition::from_sandbox_flag(self.meta.get("is_sandbox").is_some_and(is_truthy))
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    pub fn meta_uuid(&self, key: &str) -> Option<Uuid> {
        self.meta_str(key).and_then(|s| s.parse().ok())
    }
}

/// Loose truthiness for JSON metadata written by other services.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
