//! Integration tests for the browser-driven sign-in.
//!
//! A wiremock server plays the WebDriver server, answering each W3C command
//! the login script issues. These tests verify:
//! - The command sequence of a sign-in that redirects straight to the code
//! - The consent-page branch when the redirect needs an explicit "agree"
//! - Failure when the password field never appears
//! - Timeout when a found field never becomes visible
//! - The browser session is always deleted

use ebay_oauth_harness::browser::ELEMENT_KEY;
use ebay_oauth_harness::config::{FlowTimings, HarnessConfig};
use ebay_oauth_harness::consent::ConsentFlow;
use ebay_oauth_harness::oauth::OAuth2Api;
use ebay_oauth_harness::HarnessError;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{sandbox_store, sandbox_user};

const SESSION: &str = "/session/sess-1";

const REDIRECT_WITH_CODE: &str = "https://harness.example.com/accept?state=current-page&code=v%5E1.1%23i%5E1%23f%5E0&expires_in=299";

fn ok(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

fn element(id: &str) -> ResponseTemplate {
    let mut reference = serde_json::Map::new();
    reference.insert(ELEMENT_KEY.to_string(), Value::String(id.to_string()));
    ok(Value::Object(reference))
}

fn webdriver_error(status: u16, error: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "value": { "error": error, "message": format!("{error} (scripted)"), "stacktrace": "" }
    }))
}

fn config_for(server: &MockServer) -> HarnessConfig {
    HarnessConfig {
        webdriver_url: server.uri(),
        timings: FlowTimings::immediate(),
        ..HarnessConfig::default()
    }
}

async fn mount_find(server: &MockServer, selector: &str, element_id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element")))
        .and(body_partial_json(json!({ "using": "css selector", "value": selector })))
        .respond_with(element(element_id))
        .mount(server)
        .await;
}

/// Mounts the session, the sign-in pages and a deletion that must happen once.
async fn mount_sign_in_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ok(json!({ "sessionId": "sess-1", "capabilities": {} })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(server)
        .await;

    mount_find(server, "input[type='text']", "username").await;
    mount_find(server, "[name=\"signin-continue-btn\"]", "continue").await;
    mount_find(server, "[name=\"sgnBt\"]", "sign-in").await;

    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/element/username/displayed")))
        .respond_with(ok(json!(true)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element/username/value")))
        .and(body_json(json!({ "text": "harness_buyer" })))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/execute/sync")))
        .respond_with(ok(Value::Null))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(SESSION))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_password_page(server: &MockServer) {
    mount_find(server, "input[type='password']", "password").await;

    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element/password/value")))
        .and(body_json(json!({ "text": "sandbox-password" })))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Successful sign-in
// ============================================================================

#[tokio::test]
async fn test_sign_in_redirecting_straight_to_code() {
    let server = MockServer::start().await;
    mount_sign_in_pages(&server).await;
    mount_password_page(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(json!(REDIRECT_WITH_CODE)))
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let flow = ConsentFlow::new(&api, sandbox_user(), &config);

    let code = flow
        .authorization_code()
        .await
        .expect("sign-in should succeed");
    assert_eq!(code.as_deref(), Some("v%5E1.1%23i%5E1%23f%5E0"));
}

#[tokio::test]
async fn test_sign_in_through_consent_page() {
    let server = MockServer::start().await;
    mount_sign_in_pages(&server).await;
    mount_password_page(&server).await;

    // First read: still on the consent page. Afterwards: the redirect.
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(json!("https://auth.sandbox.ebay.com/oauth2/consents?x=1")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(json!(REDIRECT_WITH_CODE)))
        .mount(&server)
        .await;

    mount_find(&server, "[id=\"submit\"]", "agree").await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/element/agree/displayed")))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let url = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_response_url()
        .await
        .expect("sign-in should succeed");
    assert_eq!(url, REDIRECT_WITH_CODE);
}

#[tokio::test]
async fn test_redirect_without_trailing_parameter_yields_no_code() {
    let server = MockServer::start().await;
    mount_sign_in_pages(&server).await;
    mount_password_page(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(json!(
            "https://harness.example.com/accept?state=current-page&code=trailing"
        )))
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let code = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_code()
        .await
        .unwrap();
    assert_eq!(code, None);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_password_field_fails_and_closes_session() {
    let server = MockServer::start().await;
    mount_sign_in_pages(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element")))
        .and(body_partial_json(json!({ "value": "input[type='password']" })))
        .respond_with(webdriver_error(404, "no such element"))
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let err = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_code()
        .await
        .unwrap_err();

    match err {
        HarnessError::ElementNotFound(message) => {
            assert_eq!(message, "Failed to find password field after multiple attempts");
        }
        other => panic!("expected ElementNotFound, got {other:?}"),
    }
    // DELETE /session/sess-1 is verified by the mock's expectation on drop
}

#[tokio::test]
async fn test_hidden_username_field_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ok(json!({ "sessionId": "sess-1", "capabilities": {} })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(Value::Null))
        .mount(&server)
        .await;
    mount_find(&server, "input[type='text']", "username").await;
    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/element/username/displayed")))
        .respond_with(ok(json!(false)))
        .expect(1..)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{SESSION}/element/username/value")))
        .respond_with(ok(Value::Null))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(SESSION))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let err = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_code()
        .await
        .unwrap_err();

    match err {
        HarnessError::Timeout { what, .. } => assert!(what.contains("username field"), "{what}"),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forged_state_is_rejected() {
    let server = MockServer::start().await;
    mount_sign_in_pages(&server).await;
    mount_password_page(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{SESSION}/url")))
        .respond_with(ok(json!(
            "https://harness.example.com/accept?state=forged&code=abc&expires_in=299"
        )))
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let err = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_code()
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::StateMismatch { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_session_refused_by_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(webdriver_error(500, "session not created"))
        .mount(&server)
        .await;

    let api = OAuth2Api::new(sandbox_store());
    let config = config_for(&server);
    let err = ConsentFlow::new(&api, sandbox_user(), &config)
        .authorization_response_url()
        .await
        .unwrap_err();
    assert!(
        matches!(&err, HarnessError::WebDriver { error, .. } if error == "session not created"),
        "got {err:?}"
    );
}
