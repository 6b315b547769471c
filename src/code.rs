//! Authorization code extraction from the consent redirect.
//!
//! After the user grants consent, eBay redirects to the application's
//! accept URL with the code in the query string:
//!
//! ```text
//! https://example.com/accept?state=current-page&code=v%5E1.1%23i%5E1...&expires_in=299
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest `code=` value terminated by an `&`.
static CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"code=(.*?)&").expect("code regex should compile"));

/// Extracts the authorization code from a redirect URL.
///
/// The value is returned exactly as it appears in the URL (still
/// percent-encoded), which is the form the token endpoint expects.
///
/// Returns `None` when `code=` is absent or at the very start of the input,
/// and when the code is the last query parameter: only a value followed by
/// `&` counts.
///
/// # Examples
///
/// ```
/// use ebay_oauth_harness::code::extract_authorization_code;
///
/// let url = "https://example.com/accept?state=current-page&code=v%5E1.1&expires_in=299";
/// assert_eq!(extract_authorization_code(url).as_deref(), Some("v%5E1.1"));
/// assert_eq!(extract_authorization_code("https://example.com/declined"), None);
/// ```
#[must_use]
pub fn extract_authorization_code(url: &str) -> Option<String> {
    match url.find("code=") {
        Some(index) if index > 0 => CODE_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()),
        _ => None,
    }
}

/// Extracts the percent-decoded `state` parameter from a redirect URL.
#[must_use]
pub fn extract_state(url: &str) -> Option<String> {
    query_param(url, "state")
}

/// Extracts the percent-decoded `error_description` or `error` parameter.
#[must_use]
pub fn extract_error(url: &str) -> Option<String> {
    query_param(url, "error_description").or_else(|| query_param(url, "error"))
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query.split('&').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key == name {
            let value = value.replace('+', " ");
            Some(urlencoding::decode(&value).ok()?.into_owned())
        } else {
            None
        }
    })
}
