use super::*;
use crate::guard::{GuardPhase, SessionEvent};
use crate::test_helpers::Fixture;

fn auth_client(fx: &Fixture) -> AuthClient {
    fx.guard.install(&fx.client);
    AuthClient::new(fx.client.clone(), Arc::clone(&fx.guard))
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_stores_session_and_arms() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    let mut events = fx.guard.subscribe();
    fx.transport.reply_json(
        LOGIN_PATH,
        200,
        &json!({ "token": "fresh", "user": { "name": "Mina", "email": "mina@stickkery.com" } }),
    );

    let session = auth.login("mina@stickkery.com", "hunter2").await.unwrap();

    assert_eq!(session.token, "fresh");
    assert_eq!(fx.client.storage().token().as_deref(), Some("fresh"));
    assert_eq!(auth.current_profile().unwrap().name, "Mina");
    assert_eq!(fx.guard.phase(), GuardPhase::Armed);
    assert!(fx.guard.is_polling());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Armed);

    let request = &fx.transport.requests()[0];
    assert!(request.bearer.is_none());
    assert_eq!(request.body, Some(json!({ "email": "mina@stickkery.com", "password": "hunter2" })));
}

#[tokio::test]
async fn login_without_user_field_stores_whole_body() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    fx.transport.reply_json(LOGIN_PATH, 200, &json!({ "token": "t", "name": "Solo" }));

    let session = auth.login("solo@stickkery.com", "pw").await.unwrap();

    assert_eq!(session.user, json!({ "token": "t", "name": "Solo" }));
    assert_eq!(session.profile().name, "Solo");
}

#[tokio::test]
async fn login_without_token_is_decode_error() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    fx.transport.reply_json(LOGIN_PATH, 200, &json!({ "user": {} }));

    let err = auth.login("x@stickkery.com", "pw").await.unwrap_err();

    assert!(matches!(err, GuardError::InvalidJson(_)));
    assert!(!fx.client.storage().has_token());
    assert_eq!(fx.guard.phase(), GuardPhase::Disarmed);
}

#[tokio::test]
async fn login_disabled_account_maps_to_support_message() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    fx.transport.reply_json(LOGIN_PATH, 403, &json!({ "error": "Account has been disabled" }));

    let err = auth.login("gone@stickkery.com", "pw").await.unwrap_err();

    assert!(matches!(err, GuardError::AccountDisabled(msg) if msg == LOGIN_DISABLED_MESSAGE));
    assert!(fx.navigations().is_empty(), "no forced navigation without a session");
}

#[tokio::test]
async fn login_wrong_password_keeps_backend_message() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    fx.transport.reply_json(LOGIN_PATH, 401, &json!({ "message": "Wrong password" }));

    let err = auth.login("mina@stickkery.com", "nope").await.unwrap_err();

    assert!(matches!(err, GuardError::LoginRejected(msg) if msg == "Wrong password"));
}

#[tokio::test]
async fn login_unparsable_failure_uses_default_message() {
    let fx = Fixture::new();
    let auth = auth_client(&fx);
    fx.transport.reply_raw(LOGIN_PATH, 500, b"<html>oops</html>");

    let err = auth.login("mina@stickkery.com", "pw").await.unwrap_err();

    assert!(matches!(err, GuardError::LoginRejected(msg) if msg == "Invalid credentials"));
}

#[test]
fn login_error_treats_account_mentions_as_disabled() {
    assert!(matches!(login_error("Account not found"), GuardError::AccountDisabled(_)));
    assert!(matches!(login_error("Too many attempts"), GuardError::LoginRejected(_)));
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_session_and_disarms() {
    let fx = Fixture::new();
    fx.store_session();
    let auth = auth_client(&fx);
    let mut events = fx.guard.subscribe();

    auth.logout().unwrap();

    assert!(!fx.client.storage().has_token());
    assert!(!fx.guard.is_polling());
    assert!(!fx.guard.is_authenticated());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::SignedOut);
    assert!(auth.current_profile().is_none());
}
