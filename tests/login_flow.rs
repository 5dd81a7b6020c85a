use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use opt_auth::callback::{CallbackConfig, callback_routes};
use opt_auth::{
    AuthClient, FileStore, KeyValueStore, LoginFlow, OAuthConfig, SessionContext,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(base: &str) -> AuthClient {
    AuthClient::new(OAuthConfig::new(
        "test-key",
        "http://localhost:8080/auth/kakao".parse().unwrap(),
        base.parse().unwrap(),
    ))
}

#[tokio::test]
async fn redirect_through_listener_persists_session_to_disk() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/kakao-front"))
        .and(query_param("code", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "refreshToken": "r1",
            "role": "ROLE_USER",
            "email": "a@b.com",
            "id": 42
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("session.json");
    let session = Arc::new(SessionContext::new(Arc::new(FileStore::new(&store_path))));

    let (tx, rx) = mpsc::channel(8);
    let router = callback_routes(&CallbackConfig::new(client(&backend.uri())).unwrap(), tx);
    let flow = LoginFlow::new(Arc::new(client(&backend.uri())), session.clone());
    let login = tokio::spawn(flow.run(rx));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/auth/kakao?code=abc123&state=xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let credentials = login.await.unwrap().expect("login completes");
    assert_eq!(credentials.member_id.as_str(), "42");

    let reopened = FileStore::new(&store_path);
    let stored = reopened
        .multi_get(&["refreshToken", "role", "email", "memberId"])
        .await
        .unwrap();
    assert_eq!(
        stored,
        vec![
            Some("r1".to_string()),
            Some("ROLE_USER".to_string()),
            Some("a@b.com".to_string()),
            Some("42".to_string()),
        ]
    );

    let restored = SessionContext::new(Arc::new(reopened));
    assert_eq!(restored.require().await.unwrap(), credentials);

    session.clear().await.unwrap();
    assert!(restored.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn failed_exchange_leaves_previous_session_intact() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&backend)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("session.json")));
    store
        .multi_set(vec![
            ("refreshToken".into(), "old".into()),
            ("role".into(), "ROLE_USER".into()),
            ("email".into(), "old@b.com".into()),
            ("memberId".into(), "7".into()),
        ])
        .await
        .unwrap();

    let session = Arc::new(SessionContext::new(store.clone()));
    let mut flow = LoginFlow::new(Arc::new(client(&backend.uri())), session);

    assert!(flow.handle_redirect("https://app/auth?code=abc123").await.is_err());
    assert_eq!(store.get("refreshToken").await.unwrap().as_deref(), Some("old"));
    assert_eq!(store.get("memberId").await.unwrap().as_deref(), Some("7"));
}
