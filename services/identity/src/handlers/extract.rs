//! Per-request authentication and partition selection.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use console_auth_types::sandbox::SandboxHeaders;
use console_domain::partition::Partition;

use crate::domain::session::SessionContext;
use crate::error::IdentityServiceError;
use crate::state::AppState;
use crate::usecase::authenticate::AuthenticateRequestUseCase;

/// Session context and partition for the current request.
///
/// The caller is always resolved against the live partition; the sandbox
/// headers only decide where the rest of the request runs. A bad bearer is a
/// 401.
#[derive(Debug, Clone)]
pub struct RequestSession {
    pub ctx: SessionContext,
    pub partition: Partition,
}

impl FromRequestParts<AppState> for RequestSession {
    type Rejection = IdentityServiceError;

    // Same shape as the header extractors: read synchronously, then hand a
    // 'static future to axum.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let sandbox = SandboxHeaders::from_headers(&parts.headers);
        let bearer = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_owned());
        let state = state.clone();

        async move { authenticate(&state, sandbox, bearer).await }
    }
}

pub async fn authenticate(
    state: &AppState,
    sandbox: SandboxHeaders,
    bearer: Option<String>,
) -> Result<RequestSession, IdentityServiceError> {
    let usecase = AuthenticateRequestUseCase {
        identity: state.identity(),
    };
    let (ctx, partition) = usecase.execute(&sandbox, bearer.as_deref()).await?;
    Ok(RequestSession { ctx, partition })
}
