//! Sandbox selection headers extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::HeaderMap;
use http::request::Parts;

/// Header selecting the sandbox partition (`true`, `1`, `yes`, `on`).
pub const ACCESS_CONSOLE_SANDBOX: &str = "access-console-sandbox";

/// Header naming the API credential a sandbox request acts for.
pub const ACCESS_CONSOLE_SANDBOX_KEY: &str = "access-console-sandbox-key";

/// Raw sandbox headers as sent by the console or an API client.
///
/// `sandbox` is `None` when the header is absent, which is distinct from an
/// explicit false value: only an absent header lets the credential's test
/// mode decide. Never rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxHeaders {
    pub sandbox: Option<bool>,
    pub sandbox_key: Option<String>,
}

impl SandboxHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let sandbox = headers
            .get(ACCESS_CONSOLE_SANDBOX)
            .map(|v| v.to_str().map(parse_boolish).unwrap_or(false));

        let sandbox_key = headers
            .get(ACCESS_CONSOLE_SANDBOX_KEY)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Self {
            sandbox,
            sandbox_key,
        }
    }
}

/// Interpret a boolean-ish header value.
pub fn parse_boolish(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl<S> FromRequestParts<S> for SandboxHeaders
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    // Read synchronously and return a 'static future so the extractor does not
    // capture the `parts` borrow.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let headers = Self::from_headers(&parts.headers);
        async move { Ok(headers) }
    }
}
