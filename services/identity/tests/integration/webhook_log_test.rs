use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::{Value, json};
use uuid::Uuid;

use console_domain::partition::Partition;
use console_identity::domain::types::PersonalAccessToken;
use console_identity::domain::webhook::{
    FinalWebhookCallFailed, TransferStats, WebhookOutcome, WebhookResponse,
};
use console_identity::error::IdentityServiceError;
use console_identity::infra::webhook_listener::{record_final_attempt, spawn_webhook_listener};
use console_identity::usecase::webhook_log::RecordWebhookAttemptUseCase;

use crate::helpers::{MockStore, offline_state, test_credential};

fn recorder(store: &MockStore) -> RecordWebhookAttemptUseCase<MockStore, MockStore, MockStore> {
    RecordWebhookAttemptUseCase {
        credentials: store.clone(),
        tokens: store.clone(),
        logs: store.clone(),
    }
}

fn event(response: Option<WebhookResponse>, meta: Value) -> FinalWebhookCallFailed {
    FinalWebhookCallFailed {
        response,
        transfer_stats: TransferStats { transfer_time: 1.25 },
        http_verb: "POST".into(),
        webhook_url: "https://hooks.example.com/orders".into(),
        attempt: 3,
        headers: json!({ "content-type": "application/json" }),
        meta,
    }
}

fn response(status_code: u16, reason: &str) -> Option<WebhookResponse> {
    Some(WebhookResponse {
        status_code,
        reason_phrase: reason.into(),
        body: Some("{}".into()),
    })
}

#[tokio::test]
async fn should_record_204_as_successful() {
    let store = MockStore::default();
    let log = recorder(&store)
        .execute(&event(response(204, "No Content"), json!({})))
        .await
        .unwrap();

    assert_eq!(log.status, WebhookOutcome::Successful);
    assert_eq!(log.status_code, 204);
    assert_eq!(log.reason_phrase, "No Content");
    assert_eq!(log.method, "POST");
    assert_eq!(log.attempt, 3);
    assert_eq!(log.duration, 1.25);
    assert_eq!(log.response.as_deref(), Some("{}"));
    assert_eq!(store.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_record_missing_response_as_failed() {
    let store = MockStore::default();
    let log = recorder(&store).execute(&event(None, json!({}))).await.unwrap();

    assert_eq!(log.status, WebhookOutcome::Failed);
    assert_eq!(log.status_code, 500);
    assert_eq!(log.reason_phrase, "ERR");
    assert_eq!(log.response, None);
}

#[tokio::test]
async fn should_record_non_2xx_as_failed() {
    let store = MockStore::default();
    for code in [301, 404, 503] {
        let log = recorder(&store)
            .execute(&event(response(code, "Nope"), json!({})))
            .await
            .unwrap();
        assert_eq!(log.status, WebhookOutcome::Failed, "status {code}");
    }
}

#[tokio::test]
async fn should_attach_existing_references() {
    let credential = test_credential(Uuid::new_v4(), None, false);
    let token = PersonalAccessToken {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: "console-login".into(),
        created_at: chrono::Utc::now(),
        expires_at: chrono::Utc::now() + chrono::Duration::days(1),
    };
    let store = MockStore::default().with_credential(credential.clone());
    store.tokens.lock().unwrap().push(token.clone());
    let company_id = Uuid::new_v4();
    let webhook_id = Uuid::new_v4();

    let log = recorder(&store)
        .execute(&event(
            response(200, "OK"),
            json!({
                "api_credential_uuid": credential.id,
                "access_token_id": token.id,
                "api_key": credential.key,
                "company_uuid": company_id,
                "webhook_uuid": webhook_id,
                "api_event_uuid": "evt_not_uuid",
                "sent_at": "2026-10-18T09:00:00Z",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(log.api_credential_id, Some(credential.id));
    assert_eq!(log.access_token_id, Some(token.id));
    assert_eq!(log.key.as_deref(), Some(credential.key.as_str()));
    assert_eq!(log.company_id, Some(company_id));
    assert_eq!(log.webhook_id, Some(webhook_id));
    assert_eq!(log.api_event_id, None);
    assert_eq!(log.sent_at.as_deref(), Some("2026-10-18T09:00:00Z"));
}

#[tokio::test]
async fn should_drop_stale_references_without_failing() {
    let store = MockStore::default();
    let log = recorder(&store)
        .execute(&event(
            response(500, "Internal Server Error"),
            json!({
                "api_credential_uuid": Uuid::new_v4(),
                "access_token_id": Uuid::new_v4(),
            }),
        ))
        .await
        .unwrap();

    assert_eq!(log.api_credential_id, None);
    assert_eq!(log.access_token_id, None);
    assert_eq!(store.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_drop_references_that_cannot_be_checked() {
    let credential = test_credential(Uuid::new_v4(), None, false);
    let store = MockStore::default().with_credential(credential.clone());
    store.fail_lookups.store(true, Ordering::SeqCst);

    let log = recorder(&store)
        .execute(&event(None, json!({ "api_credential_uuid": credential.id })))
        .await
        .unwrap();

    assert_eq!(log.api_credential_id, None);
}

#[tokio::test]
async fn should_ignore_malformed_credential_reference() {
    let store = MockStore::default();
    let log = recorder(&store)
        .execute(&event(None, json!({ "api_credential_uuid": "flb_live_123" })))
        .await
        .unwrap();

    assert_eq!(log.api_credential_id, None);
}

#[tokio::test]
async fn should_surface_log_write_failure_to_listener() {
    let store = MockStore::default();
    store.fail_log_writes.store(true, Ordering::SeqCst);

    let result = recorder(&store).execute(&event(None, json!({}))).await;
    assert!(matches!(result, Err(IdentityServiceError::Internal(_))));
}

#[tokio::test]
async fn should_swallow_log_write_failure_in_listener() {
    let store = MockStore::default();
    store.fail_log_writes.store(true, Ordering::SeqCst);

    // Returns unit: the failure is logged and goes no further.
    record_final_attempt(&recorder(&store), &event(response(502, "Bad Gateway"), json!({}))).await;
    assert!(store.logs.lock().unwrap().is_empty());

    store.fail_log_writes.store(false, Ordering::SeqCst);
    record_final_attempt(&recorder(&store), &event(None, json!({}))).await;
    assert_eq!(store.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_stop_listener_once_producers_are_gone() {
    let (state, events) = offline_state(4);
    let listener = spawn_webhook_listener(state.databases(), events);

    drop(state);
    tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("listener stops when the channel closes")
        .unwrap();
}

#[test]
fn should_route_sandbox_events_to_sandbox() {
    assert_eq!(event(None, json!({ "is_sandbox": true })).partition(), Partition::Sandbox);
    assert_eq!(event(None, json!({ "is_sandbox": "yes" })).partition(), Partition::Sandbox);
    assert_eq!(event(None, json!({ "is_sandbox": false })).partition(), Partition::Live);
    assert_eq!(event(None, Value::Null).partition(), Partition::Live);
}
