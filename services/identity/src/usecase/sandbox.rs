use console_auth_types::sandbox::SandboxHeaders;
use console_domain::partition::Partition;

use crate::domain::session::SessionContext;
use crate::domain::types::ApiCredential;

/// Pick the partition for a request and record the sandbox state on `ctx`.
///
/// The sandbox header wins whenever it is present, even when false. Only an
/// absent header defers to the credential's test mode.
pub fn route(
    headers: &SandboxHeaders,
    credential: Option<&ApiCredential>,
    ctx: &mut SessionContext,
) -> Partition {
    let is_sandbox = headers
        .sandbox
        .unwrap_or_else(|| credential.is_some_and(|c| c.test_mode));

    ctx.is_sandbox = is_sandbox;
    ctx.sandbox_api_credential = if is_sandbox {
        headers
            .sandbox_key
            .clone()
            .or_else(|| credential.map(|c| c.id.to_string()))
    } else {
        None
    };

    Partition::from_sandbox_flag(is_sandbox)
}
