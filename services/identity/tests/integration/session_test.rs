use std::sync::atomic::Ordering;

use uuid::Uuid;

use console_auth_types::token::validate_access_token;
use console_domain::user::UserRole;
use console_identity::domain::session::{ApiEnvironment, Principal, SessionContext};
use console_identity::error::IdentityServiceError;
use console_identity::usecase::login::{LoginInput, LoginUseCase};
use console_identity::usecase::password::hash_password;

use crate::helpers::{MockStore, TEST_SECRET, session_manager, test_credential, test_user};

#[tokio::test]
async fn should_establish_user_principal() {
    let user = test_user(UserRole::Admin);
    let store = MockStore::default();
    let mut ctx = SessionContext::default();

    let resolved = session_manager(&store)
        .establish(&mut ctx, Principal::User(user.clone()))
        .await
        .unwrap();

    assert_eq!(resolved.map(|u| u.id), Some(user.id));
    assert_eq!(ctx.user_id, Some(user.id));
    assert_eq!(ctx.company_id, user.company_id);
    assert!(ctx.is_admin);
}

#[tokio::test]
async fn should_resolve_credential_to_linked_user() {
    let user = test_user(UserRole::User);
    let credential = test_credential(Uuid::new_v4(), Some(user.id), false);
    let store = MockStore::default().with_user(user.clone());
    let mut ctx = SessionContext::default();

    session_manager(&store)
        .establish(&mut ctx, Principal::ApiCredential(credential))
        .await
        .unwrap();

    assert_eq!(ctx.user_id, Some(user.id));
    // The resolved user's active company wins over the credential's.
    assert_eq!(ctx.company_id, user.company_id);
    assert!(!ctx.is_admin);
}

#[tokio::test]
async fn should_allow_credential_without_user() {
    let company_id = Uuid::new_v4();
    let credential = test_credential(company_id, None, false);
    let store = MockStore::default();
    let mut ctx = SessionContext::default();

    let resolved = session_manager(&store)
        .establish(&mut ctx, Principal::ApiCredential(credential))
        .await
        .unwrap();

    assert!(resolved.is_none());
    assert_eq!(ctx.company_id, Some(company_id));
    assert_eq!(ctx.user_id, None);
    assert!(!ctx.is_admin);
}

#[tokio::test]
async fn should_overwrite_on_reestablish() {
    let admin = test_user(UserRole::Admin);
    let user = test_user(UserRole::User);
    let store = MockStore::default();
    let manager = session_manager(&store);
    let mut ctx = SessionContext::default();

    manager.establish(&mut ctx, Principal::User(admin)).await.unwrap();
    manager.establish(&mut ctx, Principal::User(user.clone())).await.unwrap();

    assert_eq!(ctx.user_id, Some(user.id));
    assert!(!ctx.is_admin);
}

#[tokio::test]
async fn should_record_api_key_details() {
    let credential = test_credential(Uuid::new_v4(), None, true);
    let store = MockStore::default();
    let mut ctx = SessionContext::default();

    session_manager(&store).establish_api_key(&mut ctx, &credential);

    assert_eq!(ctx.api_credential_id, Some(credential.id));
    assert_eq!(ctx.api_key.as_deref(), Some(credential.key.as_str()));
    assert_eq!(ctx.api_secret.as_deref(), Some(credential.secret.as_str()));
    assert_eq!(ctx.api_key_version, Some(credential.created_at));
    assert_eq!(ctx.api_environment, Some(ApiEnvironment::Test));
    assert!(ctx.api_test_mode);
}

#[tokio::test]
async fn should_return_api_key_from_context() {
    let credential = test_credential(Uuid::new_v4(), None, false);
    let store = MockStore::default().with_credential(credential.clone());
    let manager = session_manager(&store);

    let mut ctx = SessionContext::default();
    assert!(manager.get_api_key(&ctx).await.is_none());

    ctx.api_credential_id = Some(credential.id);
    assert_eq!(manager.get_api_key(&ctx).await, Some(credential));

    ctx.api_credential_id = Some(Uuid::new_v4());
    assert!(manager.get_api_key(&ctx).await.is_none());
}

#[tokio::test]
async fn should_report_absent_api_key_on_storage_fault() {
    let credential = test_credential(Uuid::new_v4(), None, false);
    let store = MockStore::default().with_credential(credential.clone());
    store.fail_lookups.store(true, Ordering::SeqCst);

    let ctx = SessionContext {
        api_credential_id: Some(credential.id),
        ..Default::default()
    };
    assert!(session_manager(&store).get_api_key(&ctx).await.is_none());
}

#[tokio::test]
async fn should_mint_token_on_login() {
    let user = test_user(UserRole::Admin);
    let store = MockStore::default().with_user(user.clone());
    let mut ctx = SessionContext::default();

    let token = session_manager(&store)
        .login(&mut ctx, Principal::User(user.clone()))
        .await
        .unwrap();

    let info = validate_access_token(&token.token, TEST_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.token_id, token.id);
    assert_eq!(info.user_role, UserRole::Admin.as_u8());
    assert_eq!(ctx.access_token_id, Some(token.id));
    assert_eq!(store.tokens.lock().unwrap().len(), 1);
    assert!(store.user(user.id).unwrap().last_login_at.is_some());
}

#[tokio::test]
async fn should_refuse_login_without_user() {
    let credential = test_credential(Uuid::new_v4(), None, false);
    let store = MockStore::default();
    let mut ctx = SessionContext::default();

    let result = session_manager(&store)
        .login(&mut ctx, Principal::ApiCredential(credential))
        .await;

    assert!(matches!(result, Err(IdentityServiceError::UserNotFound)));
    assert!(store.tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_authenticate_minted_token() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let manager = session_manager(&store);

    let token = manager
        .login(&mut SessionContext::default(), Principal::User(user.clone()))
        .await
        .unwrap();

    let mut ctx = SessionContext::default();
    let authenticated = manager.authenticate_token(&mut ctx, &token.token).await.unwrap();

    assert_eq!(authenticated.id, user.id);
    assert_eq!(ctx.user_id, Some(user.id));
    assert_eq!(ctx.access_token_id, Some(token.id));
}

#[tokio::test]
async fn should_reject_token_without_backing_row() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let manager = session_manager(&store);

    let token = manager
        .login(&mut SessionContext::default(), Principal::User(user))
        .await
        .unwrap();
    store.tokens.lock().unwrap().clear();

    let result = manager
        .authenticate_token(&mut SessionContext::default(), &token.token)
        .await;
    assert!(matches!(result, Err(IdentityServiceError::InvalidToken)));
}

#[tokio::test]
async fn should_reject_token_signed_with_other_secret() {
    let user = test_user(UserRole::User);
    let store = MockStore::default().with_user(user.clone());
    let mut other = session_manager(&store);
    other.jwt_secret = "another-secret".to_owned();

    let token = other
        .login(&mut SessionContext::default(), Principal::User(user))
        .await
        .unwrap();

    let result = session_manager(&store)
        .authenticate_token(&mut SessionContext::default(), &token.token)
        .await;
    assert!(matches!(result, Err(IdentityServiceError::InvalidToken)));
}

#[tokio::test]
async fn should_login_with_password() {
    let mut user = test_user(UserRole::User);
    user.password_hash = hash_password("hunter22").unwrap();
    let store = MockStore::default().with_user(user.clone());
    let usecase = LoginUseCase {
        session: session_manager(&store),
    };

    let mut ctx = SessionContext::default();
    let token = usecase
        .execute(
            &mut ctx,
            LoginInput {
                email: user.email.to_uppercase(),
                password: "hunter22".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(ctx.access_token_id, Some(token.id));

    let wrong = usecase
        .execute(
            &mut SessionContext::default(),
            LoginInput {
                email: user.email.clone(),
                password: "hunter2".into(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(IdentityServiceError::InvalidCredentials)));

    let unknown = usecase
        .execute(
            &mut SessionContext::default(),
            LoginInput {
                email: "nobody@example.com".into(),
                password: "hunter22".into(),
            },
        )
        .await;
    assert!(matches!(unknown, Err(IdentityServiceError::InvalidCredentials)));
}
