use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::repository::{
    AccessTokenRepository, ApiCredentialRepository, WebhookLogRepository,
};
use crate::domain::types::WebhookRequestLog;
use crate::domain::webhook::FinalWebhookCallFailed;
use crate::error::IdentityServiceError;

/// Writes one log row per terminal webhook outcome.
pub struct RecordWebhookAttemptUseCase<A, T, L>
where
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
    L: WebhookLogRepository,
{
    pub credentials: A,
    pub tokens: T,
    pub logs: L,
}

impl<A, T, L> RecordWebhookAttemptUseCase<A, T, L>
where
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
    L: WebhookLogRepository,
{
    pub async fn execute(
        &self,
        event: &FinalWebhookCallFailed,
    ) -> Result<WebhookRequestLog, IdentityServiceError> {
        let log = WebhookRequestLog {
            id: Uuid::now_v7(),
            api_credential_id: self.existing_credential(event).await,
            access_token_id: self.existing_token(event).await,
            key: event.meta_str("api_key").map(str::to_owned),
            company_id: event.meta_uuid("company_uuid"),
            webhook_id: event.meta_uuid("webhook_uuid"),
            api_event_id: event.meta_uuid("api_event_uuid"),
            method: event.http_verb.clone(),
            status_code: event.status_code(),
            reason_phrase: event.reason_phrase().to_owned(),
            duration: event.transfer_stats.transfer_time,
            url: event.webhook_url.clone(),
            attempt: event.attempt,
            response: event.response.as_ref().and_then(|r| r.body.clone()),
            status: event.outcome(),
            headers: event.headers.clone(),
            meta: event.meta.clone(),
            sent_at: event.meta_str("sent_at").map(str::to_owned),
            created_at: Utc::now(),
        };
        self.logs.insert(&log).await?;
        Ok(log)
    }

    async fn existing_credential(&self, event: &FinalWebhookCallFailed) -> Option<Uuid> {
        let id = event.meta_uuid("api_credential_uuid")?;
        match self.credentials.find_by_id(id).await {
            Ok(found) => found.map(|c| c.id),
            Err(e) => {
                warn!(error = %e, credential_id = %id, "dropping unverifiable credential reference");
                None
            }
        }
    }

    async fn existing_token(&self, event: &FinalWebhookCallFailed) -> Option<Uuid> {
        let id = event.meta_uuid("access_token_id")?;
        match self.tokens.find_by_id(id).await {
            Ok(found) => found.map(|t| t.id),
            Err(e) => {
                warn!(error = %e, token_id = %id, "dropping unverifiable token reference");
                None
            }
        }
    }
}
