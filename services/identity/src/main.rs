use sea_orm::Database;
use tokio::sync::mpsc;
use tracing::info;

use console_core::tracing::init_tracing;
use console_identity::config::IdentityConfig;
use console_identity::infra::webhook_listener::spawn_webhook_listener;
use console_identity::router::build_router;
use console_identity::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = IdentityConfig::from_env();

    let live_db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to live database");
    let sandbox_db = Database::connect(&config.sandbox_database_url)
        .await
        .expect("failed to connect to sandbox database");

    let (webhook_events, webhook_rx) = mpsc::channel(config.webhook_channel_capacity);

    let state = AppState {
        live_db,
        sandbox_db,
        jwt_secret: config.jwt_secret,
        webhook_events,
    };

    spawn_webhook_listener(state.databases(), webhook_rx);

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.identity_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("identity service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
