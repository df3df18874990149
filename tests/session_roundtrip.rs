use std::sync::Arc;

use base64::Engine as _;

use bookgate::session::{AuthSession, LocalFsSessionStore, SessionStore};

fn unsigned_token(claims: serde_json::Value) -> String {
    let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(br#"{"alg":"none"}"#);
    let payload = engine.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

fn admin_token() -> String {
    unsigned_token(serde_json::json!({
        "preferred_username": "alice",
        "realm_access": { "roles": ["admin", "user"] },
    }))
}

#[tokio::test]
async fn fresh_store_means_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let session = AuthSession::load(store).await.unwrap();
    assert!(!session.authenticated());
    assert!(session.user().is_none());
    assert!(!session.is_admin());
}

#[tokio::test]
async fn login_persists_and_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let mut session = AuthSession::load(Arc::clone(&store) as Arc<dyn SessionStore>)
        .await
        .unwrap();
    let user = session.login_with_token(admin_token()).await.unwrap();
    assert_eq!(user.username, "alice");
    assert!(session.authenticated());
    assert!(session.is_admin());

    // New instance, same directory: read-once initialization from storage.
    let reloaded = AuthSession::load(store).await.unwrap();
    assert!(reloaded.authenticated());
    assert_eq!(reloaded.token(), Some(admin_token().as_str()));
    assert_eq!(reloaded.user().unwrap().username, "alice");
    assert!(reloaded.is_admin());
}

#[tokio::test]
async fn logout_clears_state_and_storage() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let mut session = AuthSession::load(Arc::clone(&store) as Arc<dyn SessionStore>)
        .await
        .unwrap();
    session.login_with_token(admin_token()).await.unwrap();
    session.logout().await.unwrap();

    assert!(!session.authenticated());
    assert!(session.user().is_none());

    let stored = store.load().await.unwrap();
    assert!(stored.token.is_none(), "token entry must be gone");
    assert!(stored.user.is_none(), "user entry must be gone");

    let reloaded = AuthSession::load(store).await.unwrap();
    assert!(!reloaded.authenticated());
}

#[tokio::test]
async fn logout_on_a_fresh_session_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let mut session = AuthSession::load(store).await.unwrap();
    session.logout().await.unwrap();
    assert!(!session.authenticated());
}

#[tokio::test]
async fn non_admin_roles_do_not_grant_admin() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let mut session = AuthSession::load(store).await.unwrap();
    let token = unsigned_token(serde_json::json!({
        "preferred_username": "bob",
        "realm_access": { "roles": ["user"] },
    }));
    session.login_with_token(token).await.unwrap();

    assert!(session.authenticated());
    assert!(!session.is_admin());
}

#[tokio::test]
async fn malformed_token_leaves_session_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalFsSessionStore::new(dir.path()));

    let mut session = AuthSession::load(store).await.unwrap();
    assert!(session.login_with_token("garbage".to_string()).await.is_err());
    assert!(!session.authenticated());
}
