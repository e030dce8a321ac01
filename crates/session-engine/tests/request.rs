//! End-to-end tests for the request primitive against a mock backend.

use serde_json::json;
use session_engine::{AuthError, RequestOptions, SessionConfig, SessionManager};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600,
    })
}

fn manager_for(server: &MockServer) -> SessionManager {
    SessionManager::with_config(SessionConfig {
        base_url: Some(server.uri()),
        refresh_token: Some("RT".to_string()),
        ..SessionConfig::default()
    })
}

#[tokio::test]
async fn refresh_stores_a_usable_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("cookie", "user_session=RT"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT")))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let token = manager.refresh_access_token(None).await.unwrap();

    assert_eq!(token.unwrap().access_token, "AT");
    assert!(!manager.is_access_token_expired());
    assert_eq!(manager.access_token(), Some("AT"));
}

#[tokio::test]
async fn refresh_treats_non_created_as_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let token = manager.refresh_access_token(None).await.unwrap();

    assert!(token.is_none());
    assert!(manager.is_access_token_expired());
}

#[tokio::test]
async fn refresh_without_base_url_is_a_config_error() {
    let mut manager = SessionManager::new();
    let err = manager.refresh_access_token(None).await.unwrap_err();
    assert!(matches!(err, AuthError::Config(_)));
}

#[tokio::test]
async fn refresh_accepts_an_override_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("cookie", "user_session=OVERRIDE"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT")))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let token = manager.refresh_access_token(Some("OVERRIDE")).await.unwrap();

    assert!(token.is_some());
}

#[tokio::test]
async fn expired_session_refreshes_before_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let response = manager.request("/test", RequestOptions::get()).await.unwrap();
    assert_eq!(response.status(), 200);

    // The refresh call must come first, then the primary request.
    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(paths, vec!["/auth/token", "/test"]);
}

#[tokio::test]
async fn refreshed_token_is_carried_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .and(header("authorization", "Bearer AT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let response = manager.request("/test", RequestOptions::get()).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unauthorized_response_triggers_exactly_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT2")))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    manager.login(session_engine::AuthToken {
        access_token: "AT".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        refresh_token: None,
    });

    // The retried response is returned as-is; a second 401 does not loop.
    let response = manager.request("/test", RequestOptions::get()).await.unwrap();
    assert_eq!(response.status(), 401);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests.iter().filter(|r| r.url.path() == "/test").count(),
        2
    );
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.url.path() == "/auth/token")
            .count(),
        1
    );
}

#[tokio::test]
async fn bare_requests_never_refresh_or_authorize() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("AT")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // The session is expired (no token at all), which must not matter here.
    let mut manager = manager_for(&server);
    let response = manager
        .request("/test", RequestOptions::get().unauthenticated())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn common_headers_are_merged_into_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test"))
        .and(header("x-app", "cartolab-cli"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = SessionManager::with_config(SessionConfig {
        base_url: Some(server.uri()),
        common_headers: Some(
            [("x-app".to_string(), "cartolab-cli".to_string())]
                .into_iter()
                .collect(),
        ),
        ..SessionConfig::default()
    });

    let response = manager
        .request("/test", RequestOptions::get().unauthenticated())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn sign_out_clears_the_session_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/auth/signout"))
        .and(body_json(json!({ "all": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    manager.login(session_engine::AuthToken {
        access_token: "AT".to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 3600,
        refresh_token: None,
    });

    manager.sign_out(false).await.unwrap();

    assert!(manager.access_token().is_none());
    assert!(manager.refresh_token().is_none());
}

#[tokio::test]
async fn sign_out_without_a_live_session_is_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/auth/signout"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let err = manager.sign_out(true).await.unwrap_err();
    assert!(matches!(err, AuthError::NoSession));
}

#[tokio::test]
async fn sign_out_maps_other_statuses_to_protocol_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/auth/signout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let mut manager = manager_for(&server);
    let err = manager.sign_out(false).await.unwrap_err();
    assert!(matches!(err, AuthError::Protocol(_)));
}
