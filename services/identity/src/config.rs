/// Identity service configuration loaded from environment variables.
#[derive(Debug)]
pub struct IdentityConfig {
    /// PostgreSQL URL of the live partition.
    pub database_url: String,
    /// PostgreSQL URL of the sandbox partition. Env var: `SANDBOX_DATABASE_URL`.
    pub sandbox_database_url: String,
    /// HMAC secret for signing access tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3112). Env var: `IDENTITY_PORT`.
    pub identity_port: u16,
    /// Bound of the webhook outcome channel (default 1024).
    pub webhook_channel_capacity: usize,
}

impl IdentityConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            sandbox_database_url: std::env::var("SANDBOX_DATABASE_URL")
                .expect("SANDBOX_DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            identity_port: std::env::var("IDENTITY_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3112),
            webhook_channel_capacity: std::env::var("WEBHOOK_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1024),
        }
    }
}
