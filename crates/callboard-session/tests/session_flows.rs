//! End-to-end session flows against a mocked backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use callboard_client::{ApiClient, ClientConfig, DurableStore, MemoryStore, AUTH_TOKEN_KEY};
use callboard_session::guard::{self, GuardDecision, Route};
use callboard_session::{
    AuthResult, Role, SessionContext, SessionState, SESSION_CHANGED_MESSAGE,
};

fn client(server: &MockServer, store: &Arc<MemoryStore>) -> ApiClient {
    let config = ClientConfig {
        base_url: server.uri(),
        ..ClientConfig::default()
    };
    ApiClient::new(config, Arc::clone(store) as Arc<dyn DurableStore>).unwrap()
}

fn me_response(role: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {"id": 1, "email": "a@b.com", "role": role}
    }))
}

async fn mount_me(server: &MockServer, token: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(me_response(role))
        .mount(server)
        .await;
}

async fn mount_slow_me(server: &MockServer, role: &str) {
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(me_response(role).set_delay(Duration::from_millis(400)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_then_fetch_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "T1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, "T1", "USER").await;

    let store = Arc::new(MemoryStore::new());
    let session = SessionContext::start(client(&server, &store), store.clone()).await;
    assert_eq!(guard::protect(&session.snapshot()), GuardDecision::Redirect(Route::Login));

    let result = session.login("a@b.com", "pw").await;

    assert_eq!(result, AuthResult::Authenticated);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.token.as_deref(), Some("T1"));
    assert_eq!(snapshot.user.as_ref().map(|u| u.role), Some(Role::User));
    assert!(!session.is_admin());
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("T1"));
    assert_eq!(guard::protect(&snapshot), GuardDecision::Render);
    assert_eq!(
        guard::route("/dashboard/users", &snapshot),
        GuardDecision::Redirect(Route::Dashboard)
    );
}

#[tokio::test]
async fn register_pending_approval() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "message": "Registration received. An administrator will review it."
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let session = SessionContext::start(client(&server, &store), store.clone()).await;

    let result = session
        .register("a@b.com", "pw", "Ada", "+15550100")
        .await;

    assert!(result.is_pending());
    assert_eq!(
        result,
        AuthResult::Pending {
            message: "Registration received. An administrator will review it.".to_string()
        }
    );
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn expired_token_on_resolve_becomes_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = SessionContext::start(client(&server, &store), store.clone()).await;

    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.snapshot().token.is_none());
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    assert_eq!(
        guard::protect(&session.snapshot()),
        GuardDecision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn resolve_round_trip_after_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "T1"})),
        )
        .mount(&server)
        .await;
    mount_me(&server, "T1", "ADMIN").await;

    let store = Arc::new(MemoryStore::new());
    let first = SessionContext::start(client(&server, &store), store.clone()).await;
    assert!(first.login("a@b.com", "pw").await.is_success());
    let before = first.snapshot();
    drop(first);

    let second = SessionContext::start(client(&server, &store), store.clone()).await;

    assert_eq!(second.snapshot(), before);
    assert!(second.is_admin());
    assert!(!second.is_super_admin());
}

#[tokio::test]
async fn logout_twice_equals_once() {
    let server = MockServer::start().await;
    mount_me(&server, "T1", "USER").await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = SessionContext::start(client(&server, &store), store.clone()).await;
    assert!(session.is_authenticated());

    session.logout();
    let once = session.snapshot();
    session.logout();

    assert_eq!(session.snapshot(), once);
    assert!(once.user.is_none());
    assert!(once.token.is_none());
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn invalid_registration_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let session = SessionContext::start(client(&server, &store), store.clone()).await;

    let missing_name = session.register("a@b.com", "pw", "   ", "+15550100").await;
    let missing_phone = session.register("a@b.com", "pw", "Ada", "").await;

    assert_eq!(
        missing_name.error(),
        Some("Name is required for registration")
    );
    assert_eq!(
        missing_phone.error(),
        Some("Phone is required for registration")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_resource_call_ends_session() {
    let server = MockServer::start().await;
    mount_me(&server, "T1", "USER").await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/agents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = SessionContext::start(client(&server, &store), store.clone()).await;
    assert!(session.is_authenticated());

    let err = session
        .track(session.api().agents().list(&[]).await)
        .unwrap_err();

    assert_eq!(err.message(), "Token expired");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn role_predicates_for_each_role() {
    for (wire, admin, super_admin) in [
        ("USER", false, false),
        ("ADMIN", true, false),
        ("SUPERADMIN", true, true),
    ] {
        let server = MockServer::start().await;
        mount_me(&server, "T1", wire).await;

        let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
        let session = SessionContext::start(client(&server, &store), store.clone()).await;

        assert_eq!(session.is_admin(), admin, "{wire}");
        assert_eq!(session.is_super_admin(), super_admin, "{wire}");
        assert!(session.has_role(Role::User), "{wire}");
    }

    let store = Arc::new(MemoryStore::new());
    let server = MockServer::start().await;
    let session = SessionContext::start(client(&server, &store), store.clone()).await;
    assert!(!session.is_admin());
    assert!(!session.is_super_admin());
    assert!(!session.has_role(Role::User));
}

#[tokio::test]
async fn connect_uses_the_client_store() {
    let server = MockServer::start().await;
    mount_me(&server, "T1", "ADMIN").await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = SessionContext::connect(client(&server, &store)).await;

    assert!(session.is_admin());
    session.logout();
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn logout_during_login_wins() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "T1"})),
        )
        .mount(&server)
        .await;
    mount_slow_me(&server, "USER").await;

    let store = Arc::new(MemoryStore::new());
    let session = Arc::new(SessionContext::connect(client(&server, &store)).await);

    let login = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.login("a@b.com", "pw").await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.logout();
    let result = login.await.unwrap();

    assert_eq!(result.error(), Some(SESSION_CHANGED_MESSAGE));
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(session.snapshot().token.is_none());
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn logout_during_resolve_wins() {
    let server = MockServer::start().await;
    mount_slow_me(&server, "USER").await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = Arc::new(SessionContext::for_client(client(&server, &store)));

    let resolve = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.resolve().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.logout();

    assert_eq!(resolve.await.unwrap(), SessionState::Anonymous);
    assert!(session.user().is_none());
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn logout_during_refresh_wins() {
    let server = MockServer::start().await;
    mount_slow_me(&server, "ADMIN").await;

    let store = Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "T1")]));
    let session = Arc::new(SessionContext::connect(client(&server, &store)).await);
    assert!(session.is_admin());

    let refresh = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.refresh_profile().await })
    };
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.logout();

    assert_eq!(refresh.await.unwrap(), SessionState::Anonymous);
    assert!(!session.is_admin());
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
}
