//! Runtime configuration for a harness run.
//!
//! Everything has a default; environment variables override the defaults
//! and CLI flags override both.
//!
//! | Variable               | Meaning                                   |
//! |------------------------|-------------------------------------------|
//! | `EBAY_TEST_ENV`        | `sandbox` (default) or `production`       |
//! | `EBAY_CONFIG_PATH`     | path of `ebay-config.yaml`                |
//! | `EBAY_TEST_CONFIG_PATH`| path of `test-config.yaml`                |
//! | `WEBDRIVER_URL`        | WebDriver server, default chromedriver's  |
//! | `WEBDRIVER_HEADLESS`   | `1`/`true` to hide the browser window     |
//! | `EBAY_PAGE_SETTLE`     | pause after navigations, e.g. `5s`        |

use std::time::Duration;

use crate::browser::{BrowserOptions, DEFAULT_WEBDRIVER_URL};
use crate::credentials::{CredentialPaths, APP_CONFIG_ENV, USER_CONFIG_ENV};
use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};

/// Selects the environment the suite runs against.
pub const ENVIRONMENT_ENV: &str = "EBAY_TEST_ENV";

/// WebDriver server address.
pub const WEBDRIVER_URL_ENV: &str = "WEBDRIVER_URL";

/// Headless browser switch.
pub const WEBDRIVER_HEADLESS_ENV: &str = "WEBDRIVER_HEADLESS";

/// Pause after each navigation.
pub const PAGE_SETTLE_ENV: &str = "EBAY_PAGE_SETTLE";

/// Fixed pauses and polling budgets of the login script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimings {
    /// Pause after each navigation or form submission.
    pub page_settle: Duration,

    /// How long an element found on the page may take to become visible.
    pub visibility_timeout: Duration,

    /// Total budget for the password field to appear.
    pub password_timeout: Duration,

    /// Pause between lookups of the password field.
    pub password_poll: Duration,
}

impl Default for FlowTimings {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_secs(5),
            visibility_timeout: Duration::from_secs(10),
            password_timeout: Duration::from_secs(30),
            password_poll: Duration::from_secs(3),
        }
    }
}

impl FlowTimings {
    /// Timings with no pauses, for scripted WebDriver servers.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            page_settle: Duration::ZERO,
            visibility_timeout: Duration::ZERO,
            password_timeout: Duration::ZERO,
            password_poll: Duration::ZERO,
        }
    }
}

/// Settings for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// The environment to authorize against.
    pub environment: Environment,

    /// Credential file locations.
    pub credential_paths: CredentialPaths,

    /// WebDriver server address.
    pub webdriver_url: String,

    /// Browser session settings.
    pub browser: BrowserOptions,

    /// Login script pauses and budgets.
    pub timings: FlowTimings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            credential_paths: CredentialPaths::default(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            browser: BrowserOptions::default(),
            timings: FlowTimings::default(),
        }
    }
}

impl HarnessConfig {
    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] for an unknown environment
    /// name, a non-boolean headless flag or an unparsable duration.
    pub fn from_env() -> HarnessResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(env) = get(ENVIRONMENT_ENV) {
            config.environment = env.parse()?;
        }
        config.credential_paths = CredentialPaths {
            app: get(APP_CONFIG_ENV).map(Into::into),
            user: get(USER_CONFIG_ENV).map(Into::into),
        };
        if let Some(url) = get(WEBDRIVER_URL_ENV) {
            config.webdriver_url = url;
        }
        if let Some(flag) = get(WEBDRIVER_HEADLESS_ENV) {
            config.browser.headless = parse_bool(WEBDRIVER_HEADLESS_ENV, &flag)?;
        }
        if let Some(settle) = get(PAGE_SETTLE_ENV) {
            config.timings.page_settle = parse_duration(PAGE_SETTLE_ENV, &settle)?;
        }
        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> HarnessResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HarnessError::InvalidConfig {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Parses a humantime duration such as `5s` or `1500ms`.
///
/// # Errors
///
/// Returns [`HarnessError::InvalidConfig`] naming `key` if the value is not a
/// duration.
pub fn parse_duration(key: &str, value: &str) -> HarnessResult<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| HarnessError::InvalidConfig {
        key: key.to_string(),
        message: e.to_string(),
    })
}
