use axum::http::StatusCode;

/// Handler for `GET /healthz`: liveness check.
///
/// Readiness depends on each service's backing stores, so services provide
/// their own `/readyz` and report through [`readiness`].
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Map the outcome of a service's dependency checks to a readiness status.
pub fn readiness<E: std::fmt::Display>(checks: Result<(), E>) -> StatusCode {
    match checks {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            ::tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
