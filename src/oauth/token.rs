//! Token endpoint responses.

use std::fmt;
use std::time::{Duration, SystemTime};

use secrecy::SecretString;
use serde::Deserialize;

/// A bearer token for calling the eBay APIs on the user's behalf.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    token_type: String,
    expires_at: SystemTime,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// Creates an access token expiring `expires_in` from now.
    #[must_use]
    pub fn new(token: SecretString, token_type: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            token,
            token_type: token_type.into(),
            expires_at: expiry_after(expires_in),
        }
    }

    /// The token value.
    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// The token type, `User Access Token` for eBay user tokens.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// When the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Returns true if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }
}

/// Expiry used when a reported lifetime does not fit in a `SystemTime`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn expiry_after(lifetime: Duration) -> SystemTime {
    let now = SystemTime::now();
    now.checked_add(lifetime)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// The refresh-token slot of a token response.
///
/// A refresh grant does not rotate the refresh token: its response carries
/// this slot with neither a token nor an expiry.
#[derive(Clone, Default)]
pub struct RefreshToken {
    token: Option<SecretString>,
    expires_at: Option<SystemTime>,
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl RefreshToken {
    /// Creates a refresh token expiring `expires_in` from now.
    #[must_use]
    pub fn new(token: SecretString, expires_in: Option<Duration>) -> Self {
        Self {
            token: Some(token),
            expires_at: expires_in.map(expiry_after),
        }
    }

    /// The token value, absent on refresh-grant responses.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// When the token stops being accepted, if known.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }
}

/// The outcome of a call to the token endpoint.
///
/// A rejected request is not an `Err`: the endpoint's error body lands in
/// [`error_message`](Self::error_message) and both tokens are absent.
#[derive(Debug, Clone, Default)]
pub struct OAuthResponse {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    error_message: Option<String>,
}

impl OAuthResponse {
    /// A successful response.
    #[must_use]
    pub fn with_tokens(access_token: AccessToken, refresh_token: RefreshToken) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            error_message: None,
        }
    }

    /// A rejected request.
    #[must_use]
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            error_message: Some(message.into()),
        }
    }

    /// The access token, if issued.
    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// The refresh token slot, if the request succeeded.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// The endpoint's error body, if the request was rejected.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns true if no error was reported.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_message.is_none()
    }
}

impl fmt::Display for OAuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.error_message {
            return write!(f, "OAuthResponse {{ error: {message} }}");
        }
        let access = self.access_token.as_ref().map(|t| {
            format!(
                "{} [REDACTED], expires in {}s",
                t.token_type,
                remaining(t.expires_at)
            )
        });
        let refresh = self.refresh_token.as_ref().map(|t| match (&t.token, t.expires_at) {
            (Some(_), Some(at)) => format!("[REDACTED], expires in {}s", remaining(at)),
            (Some(_), None) => "[REDACTED]".to_string(),
            (None, _) => "none issued".to_string(),
        });
        write!(
            f,
            "OAuthResponse {{ access_token: {}, refresh_token: {} }}",
            access.as_deref().unwrap_or("none"),
            refresh.as_deref().unwrap_or("none")
        )
    }
}

fn remaining(at: SystemTime) -> u64 {
    at.duration_since(SystemTime::now())
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// JSON body of a successful token endpoint reply.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for OAuthResponse {
    fn from(body: TokenResponse) -> Self {
        let access = AccessToken::new(
            SecretString::new(body.access_token.into()),
            body.token_type,
            Duration::from_secs(body.expires_in),
        );
        let refresh = match body.refresh_token {
            Some(token) => RefreshToken::new(
                SecretString::new(token.into()),
                body.refresh_token_expires_in.map(Duration::from_secs),
            ),
            None => RefreshToken::default(),
        };
        Self::with_tokens(access, refresh)
    }
}
