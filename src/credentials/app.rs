//! Application credentials (`ebay-config.yaml`).
//!
//! The file holds one block per environment, keyed by the environment's API
//! host:
//!
//! ```yaml
//! name: ebay-config
//! api.sandbox.ebay.com:
//!     appid: MyApp-Sandbox-PRD-1234
//!     certid: SBX-abcdef
//!     devid: 0f0f0f0f-dev
//!     redirecturi: My_Name-MyApp-Sandbo-abcde
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};
use crate::util::mask_secret;

/// The credentials an application was issued for one environment.
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    cert_id: SecretString,
    dev_id: String,
    redirect_uri: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("cert_id", &"[REDACTED]")
            .field("dev_id", &self.dev_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl AppCredentials {
    /// Creates a credential set.
    #[must_use]
    pub fn new(
        app_id: impl Into<String>,
        cert_id: SecretString,
        dev_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            cert_id,
            dev_id: dev_id.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// The client id.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The client secret.
    #[must_use]
    pub fn cert_id(&self) -> &SecretString {
        &self.cert_id
    }

    /// The developer id. Not sent with OAuth requests.
    #[must_use]
    pub fn dev_id(&self) -> &str {
        &self.dev_id
    }

    /// The RuName registered as the application's redirect target.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

#[derive(Deserialize)]
struct RawAppCredentials {
    appid: String,
    certid: String,
    devid: String,
    redirecturi: String,
}

impl From<RawAppCredentials> for AppCredentials {
    fn from(raw: RawAppCredentials) -> Self {
        Self::new(
            raw.appid,
            SecretString::new(raw.certid.into()),
            raw.devid,
            raw.redirecturi,
        )
    }
}

/// Application credentials for every environment present in the config file.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: BTreeMap<Environment, AppCredentials>,
}

impl CredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses an `ebay-config.yaml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or an environment block
    /// is missing one of `appid`, `certid`, `devid`, `redirecturi`.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml(&contents).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            environments = store.entries.len(),
            "Loaded application credentials"
        );
        Ok(store)
    }

    /// Parses the contents of an `ebay-config.yaml` file.
    ///
    /// Top-level keys that are not environment hosts are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML or an incomplete environment block.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let document: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(contents)?;
        let mut entries = BTreeMap::new();
        for (key, value) in document {
            if let Some(env) = Environment::from_config_id(&key) {
                let raw: RawAppCredentials = serde_yaml::from_value(value)?;
                entries.insert(env, raw.into());
            }
        }
        Ok(Self { entries })
    }

    /// Adds or replaces the credentials for an environment.
    pub fn insert(&mut self, env: Environment, credentials: AppCredentials) {
        self.entries.insert(env, credentials);
    }

    /// Returns the credentials for an environment.
    #[must_use]
    pub fn get(&self, env: Environment) -> Option<&AppCredentials> {
        self.entries.get(&env)
    }

    /// Returns the credentials for an environment, or an error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::MissingAppCredentials`] when absent.
    pub fn require(&self, env: Environment) -> HarnessResult<&AppCredentials> {
        self.get(env)
            .ok_or(HarnessError::MissingAppCredentials { environment: env })
    }

    /// Returns true if credentials are loaded for the environment.
    #[must_use]
    pub fn contains(&self, env: Environment) -> bool {
        self.entries.contains_key(&env)
    }

    /// Returns true if no environment has credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the loaded credentials for diagnostics, cert ids masked.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (env, creds) in &self.entries {
            let _ = writeln!(out, "Environment: {env}");
            let _ = writeln!(out, "  APP_ID: {}", creds.app_id);
            let _ = writeln!(out, "  DEV_ID: {}", creds.dev_id);
            let _ = writeln!(out, "  CERT_ID: {}", mask_secret(creds.cert_id.expose_secret()));
            let _ = writeln!(out, "  REDIRECT_URI: {}", creds.redirect_uri);
        }
        out
    }
}
