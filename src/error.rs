//! Centralized error types for the harness.
//!
//! Every fallible library operation returns [`HarnessResult`]. The binary
//! wraps these in `anyhow` for context; tests match on the variants.
//!
//! # Example
//!
//! ```
//! use ebay_oauth_harness::error::{HarnessError, HarnessResult};
//! use ebay_oauth_harness::Environment;
//!
//! fn require_app_id(app_id: Option<&str>) -> HarnessResult<&str> {
//!     app_id.ok_or(HarnessError::MissingAppCredentials {
//!         environment: Environment::Sandbox,
//!     })
//! }
//!
//! assert!(require_app_id(None).is_err());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::environment::Environment;

/// Result type alias using [`HarnessError`].
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised by the credential loaders, the OAuth binding and the
/// browser automation.
#[derive(Debug, Error)]
pub enum HarnessError {
    // ============== Configuration Errors ==============
    /// A credential file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ConfigIo {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A credential file is not valid YAML of the expected shape.
    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        /// The file that was being parsed.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration value could not be interpreted.
    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// The setting name (usually an environment variable).
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// No application credentials were loaded for the environment.
    #[error("no application credentials loaded for {environment}")]
    MissingAppCredentials {
        /// The environment that was requested.
        environment: Environment,
    },

    /// No test-user credentials were loaded for the environment.
    #[error("no user credentials loaded for {environment}")]
    MissingUserCredentials {
        /// The environment that was requested.
        environment: Environment,
    },

    // ============== OAuth Errors ==============
    /// An HTTP request (token endpoint or WebDriver server) did not complete.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered 2xx but the body was not a token response.
    #[error("failed to decode token response: {0}")]
    TokenDecode(#[source] serde_json::Error),

    /// The state echoed back on the redirect is not the one that was sent.
    #[error("state parameter mismatch: expected {expected:?}, got {actual:?}")]
    StateMismatch {
        /// The state sent with the authorization request.
        expected: String,
        /// The state found on the redirect URL, if any.
        actual: Option<String>,
    },

    // ============== Browser Errors ==============
    /// The WebDriver server returned a protocol error.
    #[error("webdriver {command} failed: {error}: {message}")]
    WebDriver {
        /// The command that was issued, e.g. `find element`.
        command: &'static str,
        /// The W3C error code, e.g. `no such element`.
        error: String,
        /// The server's error message.
        message: String,
    },

    /// The WebDriver server answered with something that is not a W3C reply.
    #[error("unexpected webdriver reply to {command}: {message}")]
    WebDriverProtocol {
        /// The command that was issued.
        command: &'static str,
        /// Description of what was wrong.
        message: String,
    },

    /// A bounded wait ran out of time.
    #[error("timed out after {}s waiting for {what}", timeout.as_secs_f32())]
    Timeout {
        /// What was being waited for.
        what: String,
        /// The wait's total budget.
        timeout: Duration,
    },

    /// A page element the login script relies on never showed up.
    #[error("{0}")]
    ElementNotFound(String),
}

/// W3C error code for a reference to an element that left the DOM.
pub const STALE_ELEMENT_REFERENCE: &str = "stale element reference";

/// W3C error code for a lookup that matched nothing.
pub const NO_SUCH_ELEMENT: &str = "no such element";

impl HarnessError {
    /// Creates a WebDriver protocol error.
    #[must_use]
    pub fn webdriver(
        command: &'static str,
        error: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::WebDriver {
            command,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout,
        }
    }

    /// Returns true if the element reference went stale.
    #[must_use]
    pub fn is_stale_element(&self) -> bool {
        matches!(self, Self::WebDriver { error, .. } if error == STALE_ELEMENT_REFERENCE)
    }

    /// Returns true if an element lookup matched nothing.
    #[must_use]
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Self::WebDriver { error, .. } if error == NO_SUCH_ELEMENT)
    }

    /// Returns true if a polling lookup should try again after this error.
    ///
    /// A page in the middle of a navigation reports either of these for an
    /// element that is about to appear.
    #[must_use]
    pub fn is_retryable_lookup(&self) -> bool {
        self.is_stale_element() || self.is_no_such_element()
    }
}
