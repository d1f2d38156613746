use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::repository::{
    AccessTokenRepository, ApiCredentialRepository, WebhookLogRepository,
};
use crate::domain::webhook::FinalWebhookCallFailed;
use crate::state::PartitionDatabases;
use crate::usecase::webhook_log::RecordWebhookAttemptUseCase;

/// Drain the outcome channel until every sender is gone.
pub fn spawn_webhook_listener(
    databases: PartitionDatabases,
    mut events: mpsc::Receiver<FinalWebhookCallFailed>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let recorder = databases.webhook_recorder(event.partition());
            record_final_attempt(&recorder, &event).await;
        }
        info!("webhook outcome channel closed");
    })
}

/// Record one outcome. Failures are logged and dropped here; nothing
/// propagates back toward the producer.
pub async fn record_final_attempt<A, T, L>(
    recorder: &RecordWebhookAttemptUseCase<A, T, L>,
    event: &FinalWebhookCallFailed,
) where
    A: ApiCredentialRepository,
    T: AccessTokenRepository,
    L: WebhookLogRepository,
{
    let partition = event.partition();
    match recorder.execute(event).await {
        Ok(log) => debug!(
            log_id = %log.id,
            status = log.status.as_str(),
            status_code = log.status_code,
            partition = %partition,
            "webhook outcome recorded"
        ),
        Err(e) => warn!(
            error = ?e,
            url = %event.webhook_url,
            partition = %partition,
            "failed to record webhook outcome"
        ),
    }
}
