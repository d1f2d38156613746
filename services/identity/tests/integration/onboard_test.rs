use std::collections::HashSet;
use std::sync::atomic::Ordering;

use console_auth_types::token::validate_access_token;
use console_domain::user::{MembershipStatus, UserRole, UserStatus};
use console_domain::verification::{DeliveryChannel, VerificationPurpose};
use console_identity::domain::session::{Principal, SessionContext};
use console_identity::error::IdentityServiceError;
use console_identity::usecase::onboard::{OnboardInput, ShouldOnboardUseCase};
use console_identity::usecase::password::verify_password;
use console_identity::usecase::verification::{
    DeliveryOutcome, VerifyCodeInput, decode_session_reference,
};

use crate::helpers::{
    MockStore, TEST_SECRET, onboard_usecase, session_manager, test_company, test_user,
    verify_usecase,
};

fn ada() -> OnboardInput {
    OnboardInput {
        name: "Ada".into(),
        email: "ada@x.com".into(),
        phone: None,
        password: "secret".into(),
        organization_name: "Acme".into(),
    }
}

#[tokio::test]
async fn should_bootstrap_admin_and_verify_end_to_end() {
    let store = MockStore::default();
    assert!(ShouldOnboardUseCase { accounts: store.clone() }.execute().await.unwrap());

    let mut ctx = SessionContext::default();
    let output = onboard_usecase(&store).execute(&mut ctx, ada()).await.unwrap();

    // First account on an empty installation becomes the admin.
    assert!(output.is_admin);
    assert_eq!(output.user.role, UserRole::Admin);
    assert_eq!(output.user.status, UserStatus::Active);
    assert_eq!(output.user.company_id, Some(output.company.id));
    assert_eq!(output.company.name, "Acme");
    assert_eq!(output.company.owner_id, output.user.id);
    assert!(output.user.username.starts_with("ada_"));
    assert!(verify_password("secret", &output.user.password_hash));
    assert_eq!(decode_session_reference(&output.session), Some(output.user.id));
    assert_eq!(output.delivery, DeliveryOutcome::Delivered(DeliveryChannel::Email));

    let token = output.token.expect("admin is signed in");
    assert_eq!(
        validate_access_token(&token.token, TEST_SECRET).unwrap().user_id,
        output.user.id
    );
    assert_eq!(ctx.user_id, Some(output.user.id));
    assert!(ctx.is_admin);

    let memberships = store.memberships.lock().unwrap().clone();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].company_id, output.company.id);
    assert_eq!(memberships[0].status, MembershipStatus::Active);
    assert_eq!(
        store.event_kinds(),
        vec!["account_created", "verification_email"]
    );
    assert!(!ShouldOnboardUseCase { accounts: store.clone() }.execute().await.unwrap());

    // The code that went out verifies the e-mail address.
    let code = store.codes_for(output.user.id)[0].clone();
    assert_eq!(code.purpose, VerificationPurpose::EmailVerification);
    let verified = verify_usecase(&store)
        .execute(
            &mut SessionContext::default(),
            VerifyCodeInput {
                session: Some(output.session.clone()),
                code: code.code,
            },
        )
        .await
        .unwrap();
    let stored = store.user(output.user.id).unwrap();
    assert_eq!(stored.email_verified_at, Some(verified.verified_at));
}

#[tokio::test]
async fn should_not_sign_in_later_users() {
    let store = MockStore::default().with_company(test_company());

    let mut ctx = SessionContext::default();
    let output = onboard_usecase(&store).execute(&mut ctx, ada()).await.unwrap();

    assert!(!output.is_admin);
    assert_eq!(output.user.role, UserRole::User);
    assert!(output.token.is_none());
    assert!(store.tokens.lock().unwrap().is_empty());
    assert_eq!(ctx, SessionContext::default());
}

#[tokio::test]
async fn should_promote_only_one_of_concurrent_first_signups() {
    let store = MockStore::default();
    let usecase = onboard_usecase(&store);
    let grace = OnboardInput {
        name: "Grace".into(),
        email: "grace@x.com".into(),
        organization_name: "Navy".into(),
        ..ada()
    };

    let mut ctx_a = SessionContext::default();
    let mut ctx_b = SessionContext::default();
    let (a, b) = tokio::join!(
        usecase.execute(&mut ctx_a, ada()),
        usecase.execute(&mut ctx_b, grace),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.is_admin, b.is_admin);
    assert_eq!(a.token.is_some(), a.is_admin);
    assert_eq!(b.token.is_some(), b.is_admin);

    let admins = store
        .users
        .lock()
        .unwrap()
        .iter()
        .filter(|u| u.role == UserRole::Admin)
        .count();
    assert_eq!(admins, 1);
    assert_eq!(store.tokens.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_keep_account_when_bootstrap_sign_in_fails() {
    let store = MockStore::default();
    store.fail_token_writes.store(true, Ordering::SeqCst);

    let mut ctx = SessionContext::default();
    let output = onboard_usecase(&store).execute(&mut ctx, ada()).await.unwrap();

    assert!(output.is_admin);
    assert!(output.token.is_none());
    assert_eq!(ctx, SessionContext::default());
    assert_eq!(store.user(output.user.id).unwrap().role, UserRole::Admin);
    assert!(store.tokens.lock().unwrap().is_empty());

    // A retry is refused, so the only way in is logging in afterwards.
    let retry = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await;
    assert!(matches!(retry, Err(IdentityServiceError::EmailAlreadyExists)));
}

#[tokio::test]
async fn should_normalize_email_and_phone() {
    let store = MockStore::default();
    let input = OnboardInput {
        email: "  Ada@X.com ".into(),
        phone: Some("   ".into()),
        ..ada()
    };

    let output = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), input)
        .await
        .unwrap();

    assert_eq!(output.user.email, "ada@x.com");
    assert_eq!(output.user.phone, None);
}

#[tokio::test]
async fn should_reject_invalid_input_before_storage() {
    let store = MockStore::default();
    let input = OnboardInput {
        email: "not-an-email".into(),
        ..ada()
    };

    let result = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), input)
        .await;

    assert!(matches!(result, Err(IdentityServiceError::Validation(_))));
    assert_eq!(store.account_write_attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_reject_registered_email() {
    let mut existing = test_user(UserRole::User);
    existing.email = "ada@x.com".into();
    let store = MockStore::default().with_user(existing);

    let result = onboard_usecase(&store)
        .execute(
            &mut SessionContext::default(),
            OnboardInput {
                email: "ADA@x.com".into(),
                ..ada()
            },
        )
        .await;

    assert!(matches!(result, Err(IdentityServiceError::EmailAlreadyExists)));
    assert!(store.companies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_retry_username_collisions() {
    let store = MockStore::default();
    store.username_collisions.store(2, Ordering::SeqCst);

    let output = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await
        .unwrap();

    assert_eq!(store.account_write_attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.user(output.user.id).unwrap().username, output.user.username);
}

#[tokio::test]
async fn should_give_up_after_five_username_collisions() {
    let store = MockStore::default();
    store.username_collisions.store(5, Ordering::SeqCst);

    let result = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await;

    assert!(matches!(result, Err(IdentityServiceError::Internal(_))));
    assert_eq!(store.account_write_attempts.load(Ordering::SeqCst), 5);
    assert!(store.users.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_keep_usernames_unique_for_identical_names() {
    let store = MockStore::default();
    let usecase = onboard_usecase(&store);

    for i in 0..20 {
        let input = OnboardInput {
            email: format!("ada{i}@x.com"),
            ..ada()
        };
        usecase
            .execute(&mut SessionContext::default(), input)
            .await
            .unwrap();
    }

    let users = store.users.lock().unwrap();
    let usernames: HashSet<_> = users.iter().map(|u| u.username.clone()).collect();
    assert_eq!(usernames.len(), 20);
}

#[tokio::test]
async fn should_write_nothing_when_account_write_fails() {
    let store = MockStore::default();
    store.fail_account_writes.store(true, Ordering::SeqCst);

    let result = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await;

    assert!(matches!(result, Err(IdentityServiceError::Internal(_))));
    assert!(store.users.lock().unwrap().is_empty());
    assert!(store.codes.lock().unwrap().is_empty());
    assert!(store.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_create_account_even_when_verification_is_not_delivered() {
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);

    let output = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await
        .unwrap();

    assert!(matches!(output.delivery, DeliveryOutcome::NotDelivered { .. }));
    assert!(store.user(output.user.id).is_some());
    assert!(output.token.is_some());
}

#[tokio::test]
async fn should_fall_back_to_sms_during_onboarding() {
    let store = MockStore::default();
    store.fail_purpose(VerificationPurpose::EmailVerification);
    let input = OnboardInput {
        phone: Some("+15550100".into()),
        ..ada()
    };

    let output = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), input)
        .await
        .unwrap();

    assert_eq!(output.delivery.channel(), Some(DeliveryChannel::Sms));
    let codes = store.codes_for(output.user.id);
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].purpose, VerificationPurpose::PhoneVerification);
}

#[tokio::test]
async fn should_mint_a_token_per_login() {
    let store = MockStore::default();
    let output = onboard_usecase(&store)
        .execute(&mut SessionContext::default(), ada())
        .await
        .unwrap();

    let mut ctx = SessionContext::default();
    session_manager(&store)
        .login(&mut ctx, Principal::User(output.user.clone()))
        .await
        .unwrap();
    assert_eq!(store.tokens.lock().unwrap().len(), 2);
}
