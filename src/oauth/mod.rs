//! OAuth 2.0 binding for eBay's authorization-code and refresh-token grants.
//!
//! The flow the harness drives:
//!
//! ```text
//! generate_user_authorization_url ──► browser consent ──► redirect ?code=..&
//!                                                             │
//!              exchange_code_for_access_token ◄───────────────┘
//!                        │ access + refresh token
//!                        ▼
//!              get_access_token(refresh_token, scopes)
//!                        │ new access token
//! ```

pub mod api;
pub mod token;

pub use self::api::OAuth2Api;
pub use self::token::{AccessToken, OAuthResponse, RefreshToken};

/// The base public scope.
pub const API_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

/// Read access to the seller's marketing data.
pub const SELL_MARKETING_READONLY_SCOPE: &str =
    "https://api.ebay.com/oauth/api_scope/sell.marketing.readonly";

/// Scopes requested when none are given.
pub const DEFAULT_SCOPES: &[&str] = &[API_SCOPE, SELL_MARKETING_READONLY_SCOPE];

/// State sent with the authorization request when none is given.
pub const DEFAULT_STATE: &str = "current-page";

/// Length of a generated state parameter in bytes (before base64 encoding).
const STATE_LENGTH: usize = 32;

/// Generates a random state parameter for CSRF protection.
///
/// The state is base64url encoded so it survives the round trip through the
/// redirect URL unchanged.
#[must_use]
pub fn generate_state() -> String {
    use base64::engine::{general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..STATE_LENGTH).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}
