//! End-to-end session flows against a local fake API server.

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use bizdesk_auth::{
    create_session_store, AuthError, Identity, Navigation, Route, RouteGuard, SessionState,
    SessionView,
};
use bizdesk_storage::{
    FileStorage, MemoryStorage, PersistentStorage, SessionPersistence, StorageError,
    StorageKeys, StorageResult,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

const GOOD_TOKEN: &str = "tok-abc";
const SLOW: Duration = Duration::from_millis(300);

type Seen = Arc<Mutex<Vec<(String, Option<String>)>>>;

fn record(seen: &Seen, path: &str, headers: &HeaderMap) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((path.to_string(), auth));
}

async fn login(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&seen, "/auth/login", &headers);
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("broken@shop.test"), _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database down" })),
        ),
        (Some(email), Some("correct")) => (
            StatusCode::OK,
            Json(json!({
                "token": GOOD_TOKEN,
                "user": {
                    "name": "Ana Ruiz",
                    "email": email,
                    "preferences": { "theme": "dark" },
                    "id": 42
                }
            })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        ),
    }
}

async fn me(State(seen): State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    record(&seen, "/auth/me", &headers);
    let expected = format!("Bearer {GOOD_TOKEN}");
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => (
            StatusCode::OK,
            Json(json!({ "user": { "name": "Ana Ruiz (server)", "email": "ana@shop.test" } })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "token revoked" })),
        ),
    }
}

async fn slow_login(
    state: State<Seen>,
    headers: HeaderMap,
    body: Json<Value>,
) -> (StatusCode, Json<Value>) {
    tokio::time::sleep(SLOW).await;
    login(state, headers, body).await
}

async fn slow_me(state: State<Seen>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    tokio::time::sleep(SLOW).await;
    me(state, headers).await
}

/// Serves `/api/...` and a delayed copy under `/slow/api/...`.
async fn spawn_server() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/slow/api/auth/login", post(slow_login))
        .route("/slow/api/auth/me", get(slow_me))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), seen)
}

fn persistence_at(path: &Path) -> Arc<SessionPersistence> {
    Arc::new(SessionPersistence::new(Box::new(FileStorage::new(path))))
}

fn slow(url: &str) -> String {
    url.replacen("/api", "/slow/api", 1)
}

/// Memory storage whose token writes fail while `token_failures` is non-zero.
struct FlakyStorage {
    inner: MemoryStorage,
    token_failures: Arc<Mutex<usize>>,
}

impl PersistentStorage for FlakyStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut failures = self.token_failures.lock().unwrap();
        if key == StorageKeys::TOKEN && *failures > 0 {
            *failures -= 1;
            return Err(StorageError::Backend("disk full".to_string()));
        }
        drop(failures);
        self.inner.set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.inner.delete(key)
    }
}

/// Persistence seeded with Ana's session, plus the knob that breaks token writes.
fn flaky_persistence() -> (Arc<SessionPersistence>, Arc<Mutex<usize>>) {
    let token_failures = Arc::new(Mutex::new(0));
    let persistence = Arc::new(SessionPersistence::new(Box::new(FlakyStorage {
        inner: MemoryStorage::new(),
        token_failures: token_failures.clone(),
    })));
    persistence
        .save_session("tok-ana", &Identity::new("Ana Ruiz", "ana@shop.test"))
        .unwrap();
    (persistence, token_failures)
}

fn persist(path: &Path, token: &str) {
    persistence_at(path)
        .save_session(token, &Identity::new("Ana Ruiz", "ana@shop.test"))
        .unwrap();
}

#[tokio::test]
async fn login_persists_token_and_identity() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = create_session_store(persistence_at(&path), &url, Duration::from_secs(5)).unwrap();
    assert_eq!(store.state(), SessionState::SignedOut);

    let identity = store.login("ana@shop.test", "correct").await.unwrap();

    assert_eq!(identity.email, "ana@shop.test");
    assert_eq!(identity.extra.get("id"), Some(&json!(42)));
    assert_eq!(store.state(), SessionState::SignedIn);
    assert_eq!(store.current_identity(), Some(identity.clone()));
    assert_eq!(store.credential(), Some(GOOD_TOKEN.to_string()));

    let persisted = persistence_at(&path);
    assert_eq!(persisted.get_token().unwrap(), Some(GOOD_TOKEN.to_string()));

    // A fresh process hydrates the same session without calling the server.
    let reopened = create_session_store(persisted, "http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
    assert_eq!(reopened.state(), SessionState::SignedIn);
    assert_eq!(reopened.current_identity(), Some(identity));
}

#[tokio::test]
async fn failed_login_leaves_storage_untouched() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = create_session_store(persistence_at(&path), &url, Duration::from_secs(5)).unwrap();
    let result = store.login("ana@shop.test", "wrong").await;

    assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    assert_eq!(store.state(), SessionState::SignedOut);
    assert!(!store.is_authenticated());
    assert!(!path.exists());
}

#[tokio::test]
async fn server_failure_on_login_is_not_invalid_credentials() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();

    let store = create_session_store(
        persistence_at(&dir.path().join("session.json")),
        &url,
        Duration::from_secs(5),
    )
    .unwrap();
    let err = store.login("broken@shop.test", "correct").await.unwrap_err();

    match err {
        AuthError::Server { status, message } => {
            assert_eq!(status, 500);
            assert!(!message.contains("database down"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_relogin_keeps_previous_session() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    persist(&path, "tok-old");

    let store = create_session_store(persistence_at(&path), &url, Duration::from_secs(5)).unwrap();
    assert!(store.login("ana@shop.test", "wrong").await.is_err());

    assert_eq!(store.state(), SessionState::SignedIn);
    assert_eq!(store.credential(), Some("tok-old".to_string()));
    assert_eq!(
        persistence_at(&path).get_token().unwrap(),
        Some("tok-old".to_string())
    );
}

#[tokio::test]
async fn outbound_requests_carry_the_stored_token() {
    let (url, seen) = spawn_server().await;
    let dir = tempdir().unwrap();

    let store = create_session_store(
        persistence_at(&dir.path().join("session.json")),
        &url,
        Duration::from_secs(5),
    )
    .unwrap();
    store.login("ana@shop.test", "correct").await.unwrap();
    store.revalidate().await.unwrap();
    store.logout().unwrap();
    let _ = store.login("ana@shop.test", "wrong").await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("/auth/login".to_string(), None),
            ("/auth/me".to_string(), Some(format!("Bearer {GOOD_TOKEN}"))),
            ("/auth/login".to_string(), None),
        ]
    );
}

#[tokio::test]
async fn revalidate_replaces_identity() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    persist(&path, GOOD_TOKEN);

    let store = create_session_store(persistence_at(&path), &url, Duration::from_secs(5)).unwrap();
    let identity = store.revalidate().await.unwrap();

    assert_eq!(identity.name, "Ana Ruiz (server)");
    assert_eq!(store.current_identity().unwrap().name, "Ana Ruiz (server)");
    assert_eq!(store.state(), SessionState::SignedIn);
}

#[tokio::test]
async fn rejected_revalidation_clears_everything() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    persist(&path, "revoked");

    let store = create_session_store(persistence_at(&path), &url, Duration::from_secs(5)).unwrap();
    assert_eq!(
        RouteGuard::resolve(Route::Clients, &*store),
        Navigation::Render(Route::Clients)
    );

    let err = store.revalidate().await.unwrap_err();

    assert!(matches!(err, AuthError::SessionRejected(_)));
    assert!(err.is_unauthorized());
    assert_eq!(store.state(), SessionState::SignedOut);
    assert!(store.current_identity().is_none());
    assert!(!persistence_at(&path).has_session().unwrap());
    assert_eq!(
        RouteGuard::resolve(Route::Clients, &*store),
        Navigation::Redirect {
            to: Route::Login,
            from: Route::Clients
        }
    );
}

#[tokio::test]
async fn relogin_that_cannot_store_token_never_mixes_users() {
    let (url, _) = spawn_server().await;
    let (persistence, token_failures) = flaky_persistence();
    let store = create_session_store(persistence.clone(), &url, Duration::from_secs(5)).unwrap();
    assert_eq!(store.credential(), Some("tok-ana".to_string()));

    *token_failures.lock().unwrap() = usize::MAX;
    let result = store.login("bob@shop.test", "correct").await;

    assert!(matches!(result, Err(AuthError::Storage(_))));
    assert!(persistence.get_token().unwrap().is_none());
    assert!(persistence.get_user::<Identity>().unwrap().is_none());
    assert_eq!(store.state(), SessionState::SignedOut);
    assert!(store.current_identity().is_none());
    assert!(store.credential().is_none());
}

#[tokio::test]
async fn relogin_with_transient_token_write_failure_keeps_old_session() {
    let (url, _) = spawn_server().await;
    let (persistence, token_failures) = flaky_persistence();
    let store = create_session_store(persistence.clone(), &url, Duration::from_secs(5)).unwrap();

    *token_failures.lock().unwrap() = 1;
    assert!(store.login("bob@shop.test", "correct").await.is_err());

    assert_eq!(persistence.get_token().unwrap(), Some("tok-ana".to_string()));
    let stored: Identity = persistence.get_user().unwrap().unwrap();
    assert_eq!(stored.email, "ana@shop.test");
    assert_eq!(store.state(), SessionState::SignedIn);
    assert_eq!(store.current_identity().unwrap().email, "ana@shop.test");
    assert_eq!(store.credential(), Some("tok-ana".to_string()));
}

#[tokio::test]
async fn logout_during_revalidation_wins() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    persist(&path, GOOD_TOKEN);

    let store =
        create_session_store(persistence_at(&path), &slow(&url), Duration::from_secs(5)).unwrap();
    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.revalidate().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.state(), SessionState::Verifying);
    store.logout().unwrap();
    assert_eq!(store.state(), SessionState::SignedOut);

    let result = pending.await.unwrap();

    assert!(matches!(result, Err(AuthError::NotLoggedIn)));
    assert_eq!(store.state(), SessionState::SignedOut);
    assert!(!store.is_authenticated());
    assert!(store.current_identity().is_none());
    assert!(!persistence_at(&path).has_session().unwrap());
}

#[tokio::test]
async fn logout_during_login_discards_response() {
    let (url, _) = spawn_server().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store =
        create_session_store(persistence_at(&path), &slow(&url), Duration::from_secs(5)).unwrap();
    let pending = {
        let store = store.clone();
        tokio::spawn(async move { store.login("ana@shop.test", "correct").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.state(), SessionState::SigningIn);
    store.logout().unwrap();

    let result = pending.await.unwrap();

    assert!(matches!(result, Err(AuthError::NotLoggedIn)));
    assert_eq!(store.state(), SessionState::SignedOut);
    assert!(store.credential().is_none());
    assert!(!persistence_at(&path).has_session().unwrap());
}
