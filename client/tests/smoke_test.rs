use std::sync::Arc;

use claim::assert_ok;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use contentflow_client::{
    AuthPhase, GeminiClient, GenerationError, GenerationProvider, GenerationRequest,
    IdentityGateway, N8nClient, SessionController,
};
use contentflow_common::{AuthEvent, ContentType, Tone};

async fn mock_identity_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "user": { "id": "user-1", "email": "alice@example.com" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    server
}

fn gateway(server: &MockServer) -> Arc<IdentityGateway> {
    Arc::new(IdentityGateway::new(&server.uri(), "anon-key"))
}

#[tokio::test]
async fn test_password_sign_in_stores_session_and_notifies() {
    let server = mock_identity_server().await;
    let gateway = gateway(&server);
    let mut subscription = gateway.subscribe();

    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);

    let change = subscription.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::SignedIn);
    let session = change.session.unwrap();
    assert_eq!(session.user.id, "user-1");
    assert_eq!(gateway.access_token().await.unwrap(), "access-1");

    subscription.unsubscribe();
}

#[tokio::test]
async fn test_sign_in_failure_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;
    let gateway = gateway(&server);

    let error = gateway
        .sign_in_with_password("alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Invalid login credentials");
    assert!(gateway.access_token().await.is_none());
}

#[tokio::test]
async fn test_session_lifecycle_through_controller() {
    let server = mock_identity_server().await;
    let gateway = gateway(&server);

    let (controller, mut phase) = SessionController::new(gateway.clone());
    let state = controller.state();
    let handle = tokio::spawn(controller.run());

    // Bootstrap resolves to Anonymous: nothing stored yet.
    phase
        .wait_for(|p| *p != AuthPhase::Loading)
        .await
        .unwrap();
    assert_eq!(*phase.borrow(), AuthPhase::Anonymous);

    // Sign-in is observed through the standing subscription.
    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);
    phase
        .wait_for(|p| matches!(p, AuthPhase::Authenticated(_)))
        .await
        .unwrap();
    {
        let state = state.read().await;
        let user = state.user().unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.credits, 500);
    }

    // Sign-out flows back to Anonymous.
    assert_ok!(gateway.sign_out().await);
    phase
        .wait_for(|p| *p == AuthPhase::Anonymous)
        .await
        .unwrap();

    handle.abort();
}

#[tokio::test]
async fn test_current_session_discards_rejected_token() {
    let server = mock_identity_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "JWT expired"
        })))
        .mount(&server)
        .await;
    let gateway = gateway(&server);

    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);
    let session = gateway.current_session().await.unwrap();
    assert!(session.is_none());
    assert!(gateway.access_token().await.is_none());
}

#[tokio::test]
async fn test_current_session_revalidates_against_provider() {
    let server = mock_identity_server().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .mount(&server)
        .await;
    let gateway = gateway(&server);

    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);
    let session = gateway.current_session().await.unwrap().unwrap();
    assert_eq!(session.user.id, "user-1");
    assert_eq!(session.access_token, "access-1");
}

#[tokio::test]
async fn test_refresh_session_emits_token_refreshed() {
    let server = mock_identity_server().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2",
            "user": { "id": "user-1", "email": "alice@example.com" }
        })))
        .mount(&server)
        .await;
    let gateway = gateway(&server);

    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);
    let mut subscription = gateway.subscribe();

    assert_ok!(gateway.refresh_session().await);

    let change = subscription.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::TokenRefreshed);
    assert_eq!(gateway.access_token().await.unwrap(), "access-2");
}

#[tokio::test]
async fn test_update_password_emits_user_updated() {
    let server = mock_identity_server().await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .mount(&server)
        .await;
    let gateway = gateway(&server);

    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);
    let mut subscription = gateway.subscribe();

    assert_ok!(gateway.update_password("brand-new-pass").await);

    let change = subscription.recv().await.unwrap();
    assert_eq!(change.event, AuthEvent::UserUpdated);
}

#[tokio::test]
async fn test_create_order_with_active_session() {
    let server = mock_identity_server().await;
    Mock::given(method("POST"))
        .and(path("/create-order"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_abc123",
            "currency": "USD",
            "amount": 2900
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);

    let payments = N8nClient::new(&server.uri(), gateway);
    let order = payments.create_order("pro", 2_900).await.unwrap();
    assert_eq!(order.id, "order_abc123");
    assert_eq!(order.currency, "USD");
    assert_eq!(order.amount, 2_900);
}

#[tokio::test]
async fn test_verify_payment_soft_success_when_endpoint_fails() {
    let server = mock_identity_server().await;
    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);

    let payments = N8nClient::new(&server.uri(), gateway);
    let verification = payments
        .verify_payment("order_abc123", "pay_1", "sig")
        .await
        .unwrap();
    assert!(verification.success);
    assert!(verification.mock);
}

#[tokio::test]
async fn test_verify_payment_passes_through_server_verdict() {
    let server = mock_identity_server().await;
    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_ok!(gateway.sign_in_with_password("alice@example.com", "hunter22").await);

    let payments = N8nClient::new(&server.uri(), gateway);
    let verification = payments
        .verify_payment("order_abc123", "pay_1", "sig")
        .await
        .unwrap();
    assert!(verification.success);
    assert!(!verification.mock);
}

fn generation_request() -> GenerationRequest {
    GenerationRequest {
        content_type: ContentType::BlogPost,
        topic: "the future of remote work".to_string(),
        tone: Tone::Professional,
    }
}

#[tokio::test]
async fn test_gemini_client_returns_generated_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(query_param("key", "api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Remote work is here to stay." }] }
            }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri(), "api-key", "gemini-test");
    let text = client.generate(generation_request()).await.unwrap();
    assert_eq!(text, "Remote work is here to stay.");
}

#[tokio::test]
async fn test_gemini_client_falls_back_on_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri(), "api-key", "gemini-test");
    let text = client.generate(generation_request()).await.unwrap();
    assert_eq!(text, "No content generated.");
}

#[tokio::test]
async fn test_gemini_client_surfaces_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&server.uri(), "api-key", "gemini-test");
    let result = client.generate(generation_request()).await;
    assert!(matches!(result, Err(GenerationError::Provider(_))));
}
