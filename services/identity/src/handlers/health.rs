use axum::extract::State;
use axum::http::StatusCode;

use console_core::health::readiness;

use crate::state::AppState;

/// `GET /readyz`: both partitions must answer.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    let checks = async {
        state.live_db.ping().await?;
        state.sandbox_db.ping().await
    }
    .await;
    readiness(checks)
}
