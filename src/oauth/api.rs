//! The three token-endpoint calls the harness makes.
//!
//! # Example
//!
//! ```no_run
//! use ebay_oauth_harness::credentials::CredentialStore;
//! use ebay_oauth_harness::oauth::{OAuth2Api, DEFAULT_SCOPES};
//! use ebay_oauth_harness::Environment;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = CredentialStore::load(Path::new("ebay-config.yaml"))?;
//!     let api = OAuth2Api::new(store);
//!
//!     let url = api.generate_user_authorization_url(
//!         Environment::Sandbox,
//!         DEFAULT_SCOPES,
//!         Some("current-page"),
//!     )?;
//!     println!("Open {url}");
//!
//!     let response = api
//!         .exchange_code_for_access_token(Environment::Sandbox, "v^1.1#i^1...")
//!         .await?;
//!     println!("{response}");
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use super::token::{OAuthResponse, TokenResponse};
use crate::credentials::{AppCredentials, CredentialStore};
use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::util::truncate_string;

/// Longest error body quoted in log lines.
const MAX_LOGGED_BODY: usize = 200;

/// Client for eBay's OAuth authorize and token endpoints.
#[derive(Debug, Clone)]
pub struct OAuth2Api {
    http: reqwest::Client,
    credentials: CredentialStore,
    web_endpoints: HashMap<Environment, String>,
    api_endpoints: HashMap<Environment, String>,
}

impl OAuth2Api {
    /// Creates a client using the environments' public endpoints.
    #[must_use]
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            web_endpoints: HashMap::new(),
            api_endpoints: HashMap::new(),
        }
    }

    /// Uses `http` for token requests.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Sends `env`'s token requests to `url` instead of eBay.
    #[must_use]
    pub fn with_token_endpoint(mut self, env: Environment, url: impl Into<String>) -> Self {
        self.api_endpoints.insert(env, url.into());
        self
    }

    /// Builds `env`'s authorization URLs on `url` instead of eBay's.
    #[must_use]
    pub fn with_authorize_endpoint(mut self, env: Environment, url: impl Into<String>) -> Self {
        self.web_endpoints.insert(env, url.into());
        self
    }

    /// The credentials this client signs requests with.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn token_endpoint(&self, env: Environment) -> &str {
        self.api_endpoints
            .get(&env)
            .map_or(env.api_endpoint(), String::as_str)
    }

    fn authorize_endpoint(&self, env: Environment) -> &str {
        self.web_endpoints
            .get(&env)
            .map_or(env.web_endpoint(), String::as_str)
    }

    /// Builds the consent page URL a user must visit.
    ///
    /// Scopes are sent in order, space separated. `state` is echoed back on
    /// the redirect.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingAppCredentials`] if `env` has no
    /// application credentials.
    pub fn generate_user_authorization_url<S: AsRef<str>>(
        &self,
        env: Environment,
        scopes: &[S],
        state: Option<&str>,
    ) -> HarnessResult<String> {
        let creds = self.credentials.require(env)?;
        let mut url = format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.authorize_endpoint(env),
            urlencoding::encode(creds.app_id()),
            urlencoding::encode(creds.redirect_uri()),
            urlencoding::encode(&join_scopes(scopes)),
        );
        if let Some(state) = state {
            url.push_str("&state=");
            url.push_str(&urlencoding::encode(state));
        }
        debug!(environment = %env, url = %url, "Generated authorization URL");
        Ok(url)
    }

    /// Exchanges an authorization code for an access and refresh token.
    ///
    /// `code` may be given as it appears in the redirect URL: it is
    /// percent-decoded once before being form-encoded into the request.
    ///
    /// # Errors
    ///
    /// Returns an error if `env` has no application credentials, the request
    /// cannot be sent, or a successful reply cannot be decoded. A rejected
    /// code is reported through [`OAuthResponse::error_message`].
    pub async fn exchange_code_for_access_token(
        &self,
        env: Environment,
        code: &str,
    ) -> HarnessResult<OAuthResponse> {
        let creds = self.credentials.require(env)?;
        let code = urlencoding::decode(code).unwrap_or(Cow::Borrowed(code));
        info!(environment = %env, "Exchanging authorization code for tokens");
        self.request_token(
            env,
            creds,
            &[
                ("grant_type", "authorization_code"),
                ("redirect_uri", creds.redirect_uri()),
                ("code", code.as_ref()),
            ],
        )
        .await
    }

    /// Obtains a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Same conditions as
    /// [`exchange_code_for_access_token`](Self::exchange_code_for_access_token).
    pub async fn get_access_token<S: AsRef<str>>(
        &self,
        env: Environment,
        refresh_token: &str,
        scopes: &[S],
    ) -> HarnessResult<OAuthResponse> {
        let creds = self.credentials.require(env)?;
        let scope = join_scopes(scopes);
        info!(environment = %env, "Refreshing access token");
        self.request_token(
            env,
            creds,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("scope", scope.as_str()),
            ],
        )
        .await
    }

    async fn request_token(
        &self,
        env: Environment,
        creds: &AppCredentials,
        form: &[(&str, &str)],
    ) -> HarnessResult<OAuthResponse> {
        let response = self
            .http
            .post(self.token_endpoint(env))
            .basic_auth(creds.app_id(), Some(creds.cert_id().expose_secret()))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                environment = %env,
                status = status.as_u16(),
                body = %truncate_string(&body, MAX_LOGGED_BODY),
                "Token request rejected"
            );
            return Ok(OAuthResponse::with_error(body));
        }

        let token_response: TokenResponse =
            serde_json::from_str(&body).map_err(HarnessError::TokenDecode)?;
        debug!(
            environment = %env,
            expires_in = token_response.expires_in,
            refresh_issued = token_response.refresh_token.is_some(),
            "Token request succeeded"
        );
        Ok(token_response.into())
    }
}

fn join_scopes<S: AsRef<str>>(scopes: &[S]) -> String {
    scopes
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}
