use super::*;

use std::sync::Arc;

use reqwest::Method;

use crate::net::RequestInterceptor;
use crate::session::StorageRepository;
use crate::storage::MemoryStorage;
use crate::test_support::{VALID_TOKEN, client, memory_session, sign_in, spawn_backend};

struct BlockProfile;

impl RequestInterceptor for BlockProfile {
    fn intercept(&self, request: &mut reqwest::Request) -> Result<(), ApiError> {
        if request.url().path() == "/api/user/get" {
            return Err(ApiError::Rejected("profile blocked".to_owned()));
        }
        Ok(())
    }
}

/// Signs the user out as soon as the avatar fetch is dispatched.
struct LogoutOnProfile(Arc<Session>);

impl RequestInterceptor for LogoutOnProfile {
    fn intercept(&self, request: &mut reqwest::Request) -> Result<(), ApiError> {
        if request.url().path() == "/api/user/get" {
            self.0.clear_user().map_err(|e| ApiError::Rejected(e.to_string()))?;
        }
        Ok(())
    }
}

fn avatar_file(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("fileshare-avatar-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG fake image").unwrap();
    path
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_stores_user_and_avatar() {
    let base = spawn_backend().await;
    let session = memory_session();
    let api = client(&base, &session);

    let state = login(&api, "alice", "pw").await.unwrap();
    assert_eq!(state.username, "alice");
    assert_eq!(state.token, VALID_TOKEN);
    assert_eq!(state.avatar_url, "/avatars/alice.png");
    assert_eq!(session.snapshot().unwrap(), state);
}

#[tokio::test]
async fn next_request_after_login_is_authenticated() {
    let base = spawn_backend().await;
    let session = memory_session();
    let api = client(&base, &session);

    login(&api, "alice", "pw").await.unwrap();
    let echoed = api.send(Method::GET, "/api/anything", None).await.unwrap();
    assert_eq!(echoed.body["authorization"], VALID_TOKEN);
}

#[tokio::test]
async fn failed_login_leaves_session_untouched() {
    let base = spawn_backend().await;
    let session = memory_session();
    let api = client(&base, &session);

    let err = login(&api, "alice", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ref e) if e.status() == Some(401)));
    assert!(!session.is_authenticated().unwrap());
}

#[tokio::test]
async fn failed_login_keeps_previous_user() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, "previous");
    let api = client(&base, &session);

    login(&api, "alice", "wrong").await.unwrap_err();
    assert_eq!(session.token().unwrap().as_deref(), Some("previous"));
}

#[tokio::test]
async fn avatar_failure_does_not_fail_login() {
    let base = spawn_backend().await;
    let session = memory_session();
    let api = client(&base, &session).with_request_interceptor(BlockProfile);

    let state = login(&api, "alice", "pw").await.unwrap();
    assert!(state.is_authenticated());
    assert_eq!(state.avatar_url, "");
}

#[tokio::test]
async fn logout_during_avatar_fetch_sticks() {
    let base = spawn_backend().await;
    let storage = Arc::new(MemoryStorage::new());
    let session = Arc::new(Session::restore(StorageRepository::new(Arc::clone(&storage))));
    let api = client(&base, &session).with_request_interceptor(LogoutOnProfile(Arc::clone(&session)));

    let state = login(&api, "alice", "pw").await.unwrap();
    assert!(!state.is_authenticated());
    assert!(!session.is_authenticated().unwrap());
    assert_eq!(session.snapshot().unwrap(), SessionState::default());

    let restored = Session::restore(StorageRepository::new(storage));
    assert!(!restored.is_authenticated().unwrap());
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_returns_backend_message() {
    let base = spawn_backend().await;
    let session = memory_session();
    let api = client(&base, &session);

    assert_eq!(register(&api, "bob", "pw").await.unwrap(), "user registered successfully");
    assert!(!session.is_authenticated().unwrap());
}

#[tokio::test]
async fn register_taken_username_is_api_error() {
    let base = spawn_backend().await;
    let api = client(&base, &memory_session());

    let err = register(&api, "taken", "pw").await.unwrap_err();
    assert!(err.to_string().contains("taken already"));
}

// =============================================================================
// profile changes
// =============================================================================

#[tokio::test]
async fn change_plan_updates_session() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, VALID_TOKEN);
    let api = client(&base, &session);

    let response = change_plan(&api, Plan::Premium).await.unwrap();
    assert_eq!(response.body["path"], "/api/user/plan/change");
    assert_eq!(response.body["body"]["plan"], "premium");
    let state = session.snapshot().unwrap();
    assert_eq!(state.plan, "premium");
    assert_eq!(state.token, VALID_TOKEN);
}

#[tokio::test]
async fn rejected_plan_change_keeps_old_plan() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, "expired");
    let api = client(&base, &session);

    let err = change_plan(&api, Plan::Plus).await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ref e) if e.status() == Some(401)));
    assert_eq!(session.snapshot().unwrap().plan, "free");
}

#[tokio::test]
async fn change_plan_signed_out_sends_nothing() {
    let base = spawn_backend().await;
    let api = client(&base, &memory_session());

    assert!(matches!(change_plan(&api, Plan::Plus).await, Err(AuthError::NotSignedIn)));
}

#[tokio::test]
async fn upload_avatar_updates_session_avatar() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, VALID_TOKEN);
    let api = client(&base, &session);
    let path = avatar_file("me.png");

    let url = upload_avatar(&api, &path).await.unwrap();
    assert_eq!(url, "/avatars/me.png");
    let state = session.snapshot().unwrap();
    assert_eq!(state.avatar_url, "/avatars/me.png");
    assert_eq!(state.plan, "free");

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[tokio::test]
async fn upload_missing_avatar_is_io_error() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, VALID_TOKEN);
    let api = client(&base, &session);

    let err = upload_avatar(&api, Path::new("/nonexistent/me.png")).await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Io { .. })));
    assert_eq!(session.snapshot().unwrap().avatar_url, "");
}

// =============================================================================
// account deletion / logout
// =============================================================================

#[tokio::test]
async fn delete_account_clears_session() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, VALID_TOKEN);
    let api = client(&base, &session);

    assert_eq!(delete_account(&api, "pw").await.unwrap(), "account deleted successfully");
    assert_eq!(session.snapshot().unwrap(), SessionState::default());
}

#[tokio::test]
async fn delete_account_wrong_password_keeps_session() {
    let base = spawn_backend().await;
    let session = memory_session();
    sign_in(&session, VALID_TOKEN);
    let api = client(&base, &session);

    let err = delete_account(&api, "nope").await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ref e) if e.status() == Some(400)));
    assert_eq!(session.token().unwrap().as_deref(), Some(VALID_TOKEN));
}

#[test]
fn logout_clears_session() {
    let session = memory_session();
    sign_in(&session, "T");
    logout(&session).unwrap();
    assert_eq!(session.snapshot().unwrap(), SessionState::default());
    logout(&session).unwrap();
}

#[test]
fn logout_on_poisoned_session_is_session_error() {
    let session = memory_session();
    session.poison();
    assert!(matches!(logout(&session), Err(AuthError::Session(SessionError::Unavailable))));
}
