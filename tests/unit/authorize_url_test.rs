//! Tests for consent page URL generation

use ebay_oauth_harness::credentials::CredentialStore;
use ebay_oauth_harness::oauth::{OAuth2Api, DEFAULT_SCOPES};
use ebay_oauth_harness::{Environment, HarnessError};

use crate::common::{sandbox_store, APP_CONFIG_YAML};

const ENCODED_SCOPES: &str = "https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope%20\
                              https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope%2Fsell.marketing.readonly";

fn api() -> OAuth2Api {
    OAuth2Api::new(CredentialStore::from_yaml(APP_CONFIG_YAML).unwrap())
}

#[test]
fn test_sandbox_url() {
    let url = api()
        .generate_user_authorization_url(Environment::Sandbox, DEFAULT_SCOPES, Some("current-page"))
        .unwrap();
    assert_eq!(
        url,
        format!(
            "https://auth.sandbox.ebay.com/oauth2/authorize?client_id=Harness-Sandbox-SBX-1234\
             &response_type=code&redirect_uri=Harness_User-HarnessS-Sandbo-abcde\
             &scope={ENCODED_SCOPES}&state=current-page"
        )
    );
}

#[test]
fn test_production_url() {
    let url = api()
        .generate_user_authorization_url(Environment::Production, DEFAULT_SCOPES, Some("current-page"))
        .unwrap();
    assert!(url.starts_with("https://auth.ebay.com/oauth2/authorize?"));
    assert!(url.contains("client_id=Harness-Prod-PRD-5678"));
    assert!(url.contains("redirect_uri=Harness_User-HarnessP-Produc-fghij"));
    assert!(url.contains(ENCODED_SCOPES));
}

#[test]
fn test_url_without_state() {
    let url = api()
        .generate_user_authorization_url(Environment::Sandbox, &["https://api.ebay.com/oauth/api_scope"], None)
        .unwrap();
    assert!(!url.contains("state="));
    assert!(url.ends_with("scope=https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope"));
}

#[test]
fn test_state_is_encoded() {
    let url = api()
        .generate_user_authorization_url(Environment::Sandbox, DEFAULT_SCOPES, Some("a b&c"))
        .unwrap();
    assert!(url.ends_with("&state=a%20b%26c"));
}

#[test]
fn test_owned_scopes_are_accepted() {
    let scopes = vec!["https://api.ebay.com/oauth/api_scope".to_string()];
    let url = api()
        .generate_user_authorization_url(Environment::Sandbox, &scopes, None)
        .unwrap();
    assert!(url.contains("scope=https%3A%2F%2Fapi.ebay.com%2Foauth%2Fapi_scope"));
}

#[test]
fn test_missing_environment_is_an_error() {
    let api = OAuth2Api::new(sandbox_store());
    let err = api
        .generate_user_authorization_url(Environment::Production, DEFAULT_SCOPES, None)
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::MissingAppCredentials {
            environment: Environment::Production
        }
    ));
}
