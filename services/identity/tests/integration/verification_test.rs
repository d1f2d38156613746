use uuid::Uuid;

use console_domain::user::UserRole;
use console_domain::verification::{DeliveryChannel, VerificationPurpose};
use console_identity::domain::session::SessionContext;
use console_identity::error::IdentityServiceError;
use console_identity::usecase::verification::{
    DeliveryOutcome, ResendVerificationUseCase, VerifyCodeInput, encode_session_reference,
};

use crate::helpers::{MockStore, test_code, test_user, verification, verify_usecase};

fn input(session: Option<String>, code: &str) -> VerifyCodeInput {
    VerifyCodeInput {
        session,
        code: code.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_email_code_with_outbox_event() {
    let user = test_user(UserRole::User);
    let store = MockStore::default();

    let code = verification(&store).issue_email(&user).await.unwrap();

    assert_eq!(code.subject_id, user.id);
    assert_eq!(code.purpose, VerificationPurpose::EmailVerification);
    assert_eq!(code.code.len(), 6);
    let lifetime = code.expires_at - code.created_at;
    assert_eq!(lifetime.num_seconds(), 3600);

    let events = store.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "verification_email");
    assert_eq!(events[0].payload["to"], user.email);
    assert_eq!(events[0].payload["code"], code.code);
}

#[tokio::test]
async fn should_refuse_sms_without_phone() {
    let user = test_user(UserRole::User);
    let store = MockStore::default();

    let result = verification(&store).issue_sms(&user).await;

    assert!(matches!(result, Err(IdentityServiceError::Delivery(_))));
    assert!(store.codes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_report_write_failure_as_delivery_error() {
    let user = test_user(UserRole::User);
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);

    let err = verification(&store).issue_email(&user).await.unwrap_err();
    assert!(matches!(err, IdentityServiceError::Delivery(_)));
    // Storage details stay out of the message.
    assert!(!err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn should_deliver_by_email_first() {
    let mut user = test_user(UserRole::User);
    user.phone = Some("+15550100".into());
    let store = MockStore::default();

    let outcome = verification(&store).deliver_with_fallback(&user).await;

    assert_eq!(outcome, DeliveryOutcome::Delivered(DeliveryChannel::Email));
    assert_eq!(store.event_kinds(), vec!["verification_email"]);
}

#[tokio::test]
async fn should_fall_back_to_sms() {
    let mut user = test_user(UserRole::User);
    user.phone = Some("+15550100".into());
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);

    let outcome = verification(&store).deliver_with_fallback(&user).await;

    assert_eq!(outcome.channel(), Some(DeliveryChannel::Sms));
    assert!(matches!(outcome, DeliveryOutcome::FellBack { .. }));
    assert_eq!(store.event_kinds(), vec!["verification_sms"]);
}

#[tokio::test]
async fn should_aggregate_errors_when_nothing_delivered() {
    let mut user = test_user(UserRole::User);
    user.phone = Some("+15550100".into());
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);
    store.fail_purpose(VerificationPurpose::PhoneVerification);

    let outcome = verification(&store).deliver_with_fallback(&user).await;

    match outcome {
        DeliveryOutcome::NotDelivered { errors } => assert_eq!(errors.len(), 2),
        other => panic!("expected NotDelivered, got {other:?}"),
    }
}

#[tokio::test]
async fn should_not_try_sms_without_phone() {
    let user = test_user(UserRole::User);
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);

    let outcome = verification(&store).deliver_with_fallback(&user).await;

    match outcome {
        DeliveryOutcome::NotDelivered { errors } => assert_eq!(errors.len(), 1),
        other => panic!("expected NotDelivered, got {other:?}"),
    }
}

#[tokio::test]
async fn should_verify_email_code_once() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let code = verification(&store).issue_email(&user).await.unwrap();
    let usecase = verify_usecase(&store);

    let mut ctx = SessionContext::default();
    let output = usecase
        .execute(&mut ctx, input(Some(encode_session_reference(user.id)), &code.code))
        .await
        .unwrap();

    assert_eq!(output.user_id, user.id);
    assert_eq!(output.purpose, VerificationPurpose::EmailVerification);
    assert_eq!(ctx.user_id, Some(user.id));
    assert_eq!(ctx.access_token_id, Some(output.token.id));

    let stored = store.user(user.id).unwrap();
    assert_eq!(stored.email_verified_at, Some(output.verified_at));
    assert!(stored.phone_verified_at.is_none());
    assert!(stored.last_login_at.is_some());
    assert!(store.codes_for(user.id)[0].used_at.is_some());

    // Replaying the same code fails.
    let replay = usecase
        .execute(
            &mut SessionContext::default(),
            input(Some(encode_session_reference(user.id)), &code.code),
        )
        .await;
    assert!(matches!(replay, Err(IdentityServiceError::InvalidCode)));
}

#[tokio::test]
async fn should_stamp_phone_for_phone_code() {
    let mut user = test_user(UserRole::User);
    user.phone = Some("+15550100".into());
    let store = MockStore::default().with_user(user.clone());
    let code = verification(&store).issue_sms(&user).await.unwrap();

    let output = verify_usecase(&store)
        .execute(&mut SessionContext::default(), input(Some(user.id.to_string()), &code.code))
        .await
        .unwrap();

    assert_eq!(output.purpose, VerificationPurpose::PhoneVerification);
    let stored = store.user(user.id).unwrap();
    assert!(stored.phone_verified_at.is_some());
    assert!(stored.email_verified_at.is_none());
}

#[tokio::test]
async fn should_reject_unrelated_code() {
    let user = test_user(UserRole::User);
    let other = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone()).with_user(other.clone());
    let others_code = verification(&store).issue_email(&other).await.unwrap();

    let result = verify_usecase(&store)
        .execute(
            &mut SessionContext::default(),
            input(Some(encode_session_reference(user.id)), &others_code.code),
        )
        .await;

    assert!(matches!(result, Err(IdentityServiceError::InvalidCode)));
    assert!(store.user(user.id).unwrap().email_verified_at.is_none());
}

#[tokio::test]
async fn should_reject_expired_code() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let mut code = test_code(user.id, VerificationPurpose::EmailVerification, "424242");
    code.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
    store.codes.lock().unwrap().push(code);

    let result = verify_usecase(&store)
        .execute(&mut SessionContext::default(), input(Some(user.id.to_string()), "424242"))
        .await;
    assert!(matches!(result, Err(IdentityServiceError::InvalidCode)));
}

#[tokio::test]
async fn should_fall_back_to_signed_in_user() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let code = verification(&store).issue_email(&user).await.unwrap();

    let mut ctx = SessionContext {
        user_id: Some(user.id),
        ..Default::default()
    };
    let output = verify_usecase(&store)
        .execute(&mut ctx, input(None, &code.code))
        .await
        .unwrap();

    assert_eq!(output.user_id, user.id);
}

#[tokio::test]
async fn should_require_a_session() {
    let store = MockStore::default();
    let result = verify_usecase(&store)
        .execute(&mut SessionContext::default(), input(None, "123456"))
        .await;
    assert!(matches!(result, Err(IdentityServiceError::SessionNotFound)));
}

#[tokio::test]
async fn should_report_missing_subject_user() {
    let subject = Uuid::new_v4();
    let store = MockStore::default();
    store
        .codes
        .lock()
        .unwrap()
        .push(test_code(subject, VerificationPurpose::EmailVerification, "111111"));

    let result = verify_usecase(&store)
        .execute(&mut SessionContext::default(), input(Some(subject.to_string()), "111111"))
        .await;
    assert!(matches!(result, Err(IdentityServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_resend_email_by_reference() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let usecase = ResendVerificationUseCase {
        users: store.clone(),
        verification: verification(&store),
    };

    usecase.email(&encode_session_reference(user.id)).await.unwrap();
    assert_eq!(store.codes_for(user.id).len(), 1);

    let unknown = usecase.email(&encode_session_reference(Uuid::new_v4())).await;
    assert!(matches!(unknown, Err(IdentityServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_ignore_unknown_sms_reference() {
    let store = MockStore::default();
    let usecase = ResendVerificationUseCase {
        users: store.clone(),
        verification: verification(&store),
    };

    usecase.sms(&encode_session_reference(Uuid::new_v4())).await.unwrap();
    usecase.sms("not-a-reference").await.unwrap();
    assert!(store.codes.lock().unwrap().is_empty());
}
