//! Tests for authorization code extraction

use ebay_oauth_harness::code::{extract_authorization_code, extract_error, extract_state};
use proptest::prelude::*;

mod extraction_tests {
    use super::*;

    #[test]
    fn test_code_from_sandbox_redirect() {
        let url = "https://signin.sandbox.ebay.com/ws/eBayISAPI.dll?ThirdPartyAuthSucessFailure\
                   &isAuthSuccessful=true&state=current-page\
                   &code=v%5E1.1%23i%5E1%23p%5E3%23r%5E1%23I%5E3%23f%5E0%23t%5EUl41&expires_in=299";
        assert_eq!(
            extract_authorization_code(url).as_deref(),
            Some("v%5E1.1%23i%5E1%23p%5E3%23r%5E1%23I%5E3%23f%5E0%23t%5EUl41")
        );
    }

    #[test]
    fn test_first_code_wins() {
        let url = "https://x/accept?code=first&code=second&y=1";
        assert_eq!(extract_authorization_code(url).as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_code_value() {
        let url = "https://x/accept?code=&expires_in=299";
        assert_eq!(extract_authorization_code(url).as_deref(), Some(""));
    }

    #[test]
    fn test_code_at_start_of_input_is_ignored() {
        assert_eq!(extract_authorization_code("code=abc&x=1"), None);
    }

    #[test]
    fn test_code_as_last_parameter_is_ignored() {
        assert_eq!(extract_authorization_code("https://x/accept?state=s&code=abc"), None);
    }

    #[test]
    fn test_no_code() {
        assert_eq!(extract_authorization_code(""), None);
        assert_eq!(
            extract_authorization_code("https://auth.sandbox.ebay.com/oauth2/consents?x=1"),
            None
        );
    }
}

mod query_param_tests {
    use super::*;

    #[test]
    fn test_state_is_decoded() {
        let url = "https://x/accept?state=page%20two&code=abc&expires_in=1";
        assert_eq!(extract_state(url).as_deref(), Some("page two"));
    }

    #[test]
    fn test_missing_state() {
        assert_eq!(extract_state("https://x/accept?code=abc&y=1"), None);
        assert_eq!(extract_state("no query at all"), None);
    }

    #[test]
    fn test_error_description_preferred() {
        let url = "https://x/accept?error=access_denied&error_description=user+declined";
        assert_eq!(extract_error(url).as_deref(), Some("user declined"));
        assert_eq!(
            extract_error("https://x/accept?error=access_denied").as_deref(),
            Some("access_denied")
        );
    }
}

proptest! {
    #[test]
    fn prop_code_followed_by_parameter_is_extracted(
        code in "[A-Za-z0-9%._~-]{1,64}",
        state in "[a-z-]{1,16}",
    ) {
        let url = format!("https://x/accept?state={state}&code={code}&expires_in=299");
        prop_assert_eq!(extract_authorization_code(&url), Some(code));
    }

    #[test]
    fn prop_trailing_code_is_never_extracted(code in "[A-Za-z0-9%._~-]{0,64}") {
        let url = format!("https://x/accept?state=s&code={code}");
        prop_assert_eq!(extract_authorization_code(&url), None);
    }

    #[test]
    fn prop_url_without_code_marker_yields_none(url in "[a-z:/.?&=]{0,80}") {
        prop_assume!(!url.contains("code="));
        prop_assert_eq!(extract_authorization_code(&url), None);
    }
}
