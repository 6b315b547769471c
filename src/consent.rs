//! Browser-driven sign-in and consent.
//!
//! Plays the part of the user on eBay's hosted pages:
//!
//! 1. Open the authorization URL
//! 2. Enter the username and continue
//! 3. Wait for the password page, enter the password and sign in
//! 4. Grant consent if the page asks for it
//! 5. Read the redirect URL, which carries the authorization code
//!
//! # Example
//!
//! ```no_run
//! use ebay_oauth_harness::config::HarnessConfig;
//! use ebay_oauth_harness::consent::ConsentFlow;
//! use ebay_oauth_harness::credentials::CredentialLoader;
//! use ebay_oauth_harness::oauth::OAuth2Api;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarnessConfig::from_env()?;
//!     let creds = CredentialLoader::load(config.environment, &config.credential_paths);
//!     let api = OAuth2Api::new(creds.apps().clone());
//!     let user = creds.user().expect("test user").clone();
//!
//!     let code = ConsentFlow::new(&api, user, &config).authorization_code().await?;
//!     println!("code obtained: {}", code.is_some());
//!     Ok(())
//! }
//! ```

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::browser::{wait_until_visible, BrowserOptions, FluentWait, Locator, WebDriver};
use crate::code::{extract_authorization_code, extract_error, extract_state};
use crate::config::{FlowTimings, HarnessConfig};
use crate::credentials::UserCredentials;
use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::oauth::{OAuth2Api, DEFAULT_SCOPES, DEFAULT_STATE};

/// Selectors of eBay's hosted sign-in and consent pages.
mod selectors {
    /// Username field on the first sign-in page.
    pub const USERNAME_FIELD: &str = "input[type='text']";

    /// "Continue" button under the username.
    pub const CONTINUE_BUTTON: &str = "signin-continue-btn";

    /// Password field on the second sign-in page.
    pub const PASSWORD_FIELD: &str = "input[type='password']";

    /// "Sign in" button under the password.
    pub const SIGN_IN_BUTTON: &str = "sgnBt";

    /// "Agree" button of the consent page.
    pub const AGREE_BUTTON: &str = "submit";
}

/// Drives one sign-in through a WebDriver session.
#[derive(Debug)]
pub struct ConsentFlow<'a> {
    api: &'a OAuth2Api,
    user: UserCredentials,
    environment: Environment,
    scopes: Vec<String>,
    state: Option<String>,
    webdriver_url: String,
    browser: BrowserOptions,
    timings: FlowTimings,
}

impl<'a> ConsentFlow<'a> {
    /// Creates a flow for `user` using the run's environment, WebDriver
    /// server and timings, requesting the default scopes.
    #[must_use]
    pub fn new(api: &'a OAuth2Api, user: UserCredentials, config: &HarnessConfig) -> Self {
        Self {
            api,
            user,
            environment: config.environment,
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            state: Some(DEFAULT_STATE.to_string()),
            webdriver_url: config.webdriver_url.clone(),
            browser: config.browser.clone(),
            timings: config.timings,
        }
    }

    /// Requests `scopes` instead of the defaults.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Sends `state` with the authorization request, or none at all.
    ///
    /// When a state is sent and the redirect echoes a different one, the
    /// flow fails with [`HarnessError::StateMismatch`].
    #[must_use]
    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    /// The scopes that will be requested.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Signs in, grants consent and returns the final page URL.
    ///
    /// The browser session is closed before returning, whether or not the
    /// script succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization URL cannot be built, the
    /// WebDriver server fails, or a page element never appears.
    pub async fn authorization_response_url(&self) -> HarnessResult<String> {
        let authorize_url = self.api.generate_user_authorization_url(
            self.environment,
            &self.scopes,
            self.state.as_deref(),
        )?;

        let driver = WebDriver::connect(&self.webdriver_url, &self.browser).await?;
        let result = self.sign_in(&driver, &authorize_url).await;

        if let Err(e) = driver.quit().await {
            warn!(error = %e, "Failed to close browser session");
        }
        result
    }

    async fn sign_in(&self, driver: &WebDriver, authorize_url: &str) -> HarnessResult<String> {
        info!(environment = %self.environment, "Opening consent page");
        driver.goto(authorize_url).await?;
        self.settle().await;

        let username = driver.find(&Locator::css(selectors::USERNAME_FIELD)).await?;
        wait_until_visible(&username, "username field", self.timings.visibility_timeout).await?;
        username.send_keys(self.user.username()).await?;
        driver
            .find(&Locator::name(selectors::CONTINUE_BUTTON))
            .await?
            .submit()
            .await?;
        debug!("Submitted username");

        let password_locator = Locator::css(selectors::PASSWORD_FIELD);
        let locator = &password_locator;
        let password = FluentWait::new(self.timings.password_timeout)
            .polling_every(self.timings.password_poll)
            .described_as("password field")
            .until(move || async move { driver.find(locator).await.map(Some) })
            .await
            .map_err(|e| match e {
                HarnessError::Timeout { .. } => HarnessError::ElementNotFound(
                    "Failed to find password field after multiple attempts".to_string(),
                ),
                other => other,
            })?;

        password
            .send_keys(self.user.password().expose_secret())
            .await?;
        driver
            .find(&Locator::name(selectors::SIGN_IN_BUTTON))
            .await?
            .submit()
            .await?;
        debug!("Submitted password");
        self.settle().await;

        let current = driver.current_url().await?;
        let url = if current.contains("code=") {
            info!("Code obtained");
            current
        } else {
            debug!("Consent page shown, granting access");
            let agree = driver.find(&Locator::id(selectors::AGREE_BUTTON)).await?;
            wait_until_visible(&agree, "consent button", self.timings.visibility_timeout).await?;
            agree.submit().await?;
            self.settle().await;
            driver.current_url().await?
        };

        if let Some(error) = extract_error(&url) {
            warn!(error = %error, "Authorization server reported an error");
        }
        self.check_state(&url)?;
        Ok(url)
    }

    fn check_state(&self, url: &str) -> HarnessResult<()> {
        let Some(expected) = &self.state else {
            return Ok(());
        };
        if !url.contains("code=") {
            return Ok(());
        }
        let actual = extract_state(url);
        if actual.as_deref() == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(HarnessError::StateMismatch {
                expected: expected.clone(),
                actual,
            })
        }
    }

    /// Signs in and extracts the authorization code from the redirect.
    ///
    /// Returns `Ok(None)` when the final URL carries no extractable code.
    ///
    /// # Errors
    ///
    /// Same as [`authorization_response_url`](Self::authorization_response_url).
    pub async fn authorization_code(&self) -> HarnessResult<Option<String>> {
        let url = self.authorization_response_url().await?;
        let code = extract_authorization_code(&url);
        if code.is_none() {
            warn!("Redirect URL carries no authorization code");
        }
        Ok(code)
    }

    async fn settle(&self) {
        if !self.timings.page_settle.is_zero() {
            tokio::time::sleep(self.timings.page_settle).await;
        }
    }
}
