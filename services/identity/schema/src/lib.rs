//! sea-orm entities for the identity service. The same schema is migrated
//! into both the live and the sandbox database.

pub mod api_credentials;
pub mod companies;
pub mod company_users;
pub mod outbox_events;
pub mod personal_access_tokens;
pub mod users;
pub mod verification_codes;
pub mod webhook_request_logs;
