//! Test-user credentials (`test-config.yaml`).
//!
//! ```yaml
//! sandbox-user:
//!     username: testuser_seller
//!     password: hunter2
//! production-user:
//!     username: ...
//!     password: ...
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{HarnessError, HarnessResult};

/// The sign-in details of a user that can consent to the application.
#[derive(Clone)]
pub struct UserCredentials {
    username: String,
    password: SecretString,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl UserCredentials {
    /// Creates a user credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// The sign-in name typed on the first login page.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password typed on the second login page.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

#[derive(Deserialize)]
struct RawUserCredentials {
    username: String,
    password: String,
}

/// Test users for every environment present in the config file.
#[derive(Debug, Clone, Default)]
pub struct UserCredentialStore {
    entries: BTreeMap<Environment, UserCredentials>,
}

impl UserCredentialStore {
    /// Reads and parses a `test-config.yaml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a user block lacks a
    /// username or password.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_yaml(&contents).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), users = store.entries.len(), "Loaded test users");
        Ok(store)
    }

    /// Parses the contents of a `test-config.yaml` file.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML or an incomplete user block.
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let document: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(contents)?;
        let mut entries = BTreeMap::new();
        for env in Environment::all() {
            if let Some(value) = document.get(env.user_key()) {
                let raw: RawUserCredentials = serde_yaml::from_value(value.clone())?;
                entries.insert(
                    env,
                    UserCredentials::new(raw.username, SecretString::new(raw.password.into())),
                );
            }
        }
        Ok(Self { entries })
    }

    /// Returns the test user for an environment.
    #[must_use]
    pub fn get(&self, env: Environment) -> Option<&UserCredentials> {
        self.entries.get(&env)
    }
}
