use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use console_core::health::healthz;
use console_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    auth::{get_session, login},
    health::readyz,
    onboard::{
        create_account, send_verification_email, send_verification_sms, should_onboard,
        verify_email,
    },
    webhook::enqueue_final_failure,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Onboarding
        .route("/int/v1/onboard/should-onboard", get(should_onboard))
        .route("/int/v1/onboard/create-account", post(create_account))
        .route(
            "/int/v1/onboard/send-verification-email",
            post(send_verification_email),
        )
        .route(
            "/int/v1/onboard/send-verification-sms",
            post(send_verification_sms),
        )
        .route("/int/v1/onboard/verify-email", post(verify_email))
        // Session
        .route("/int/v1/auth/login", post(login))
        .route("/int/v1/auth/session", get(get_session))
        // Webhook outcomes
        .route(
            "/int/v1/webhook-events/final-failure",
            post(enqueue_final_failure),
        )
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
