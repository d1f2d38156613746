//! Request header builders.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header::AUTHORIZATION};
use uuid::Uuid;

use console_auth_types::sandbox::{ACCESS_CONSOLE_SANDBOX, ACCESS_CONSOLE_SANDBOX_KEY};

/// Headers of a console or API request, built up fluently.
#[derive(Debug, Default, Clone)]
pub struct MockRequest {
    sandbox: Option<String>,
    sandbox_key: Option<String>,
    bearer: Option<String>,
}

impl MockRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `Access-Console-Sandbox` with the given raw value.
    pub fn sandbox(mut self, value: &str) -> Self {
        self.sandbox = Some(value.to_owned());
        self
    }

    /// Send `Access-Console-Sandbox-Key` naming a credential.
    pub fn sandbox_key(mut self, credential_id: Uuid) -> Self {
        self.sandbox_key = Some(credential_id.to_string());
        self
    }

    /// Send `Authorization: Bearer <token>`.
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(ref value) = self.sandbox {
            map.insert(
                HeaderName::from_static(ACCESS_CONSOLE_SANDBOX),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        if let Some(ref value) = self.sandbox_key {
            map.insert(
                HeaderName::from_static(ACCESS_CONSOLE_SANDBOX_KEY),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        if let Some(ref token) = self.bearer {
            map.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
            );
        }
        map
    }
}
