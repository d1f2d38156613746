use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::domain::webhook::FinalWebhookCallFailed;
use crate::error::IdentityServiceError;
use crate::state::AppState;

/// Hand a terminal delivery outcome to the recorder. Never waits on storage.
pub async fn enqueue_final_failure(
    State(state): State<AppState>,
    Json(event): Json<FinalWebhookCallFailed>,
) -> Result<StatusCode, IdentityServiceError> {
    state.webhook_events.try_send(event).map_err(|e| {
        warn!(error = %e, "dropping webhook outcome");
        IdentityServiceError::QueueUnavailable
    })?;
    Ok(StatusCode::ACCEPTED)
}
