//! Credential loading for the harness.
//!
//! Two YAML files feed a run:
//!
//! - `ebay-config.yaml`: the application's keys per environment
//!   ([`CredentialStore`]);
//! - `test-config.yaml`: a test user per environment who signs in and
//!   grants consent ([`UserCredentialStore`]).
//!
//! [`CredentialLoader`] reads both for one environment and records what is
//! missing instead of failing, so callers can skip work that needs
//! credentials the machine does not have.
//!
//! # Lookup order
//!
//! Each file is found at the first of:
//!
//! 1. an explicit path;
//! 2. `EBAY_CONFIG_PATH` / `EBAY_TEST_CONFIG_PATH`;
//! 3. the working directory;
//! 4. the platform config directory (e.g. `~/.config/ebay-oauth-harness/`).

pub mod app;
pub mod user;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use self::app::{AppCredentials, CredentialStore};
pub use self::user::{UserCredentialStore, UserCredentials};

use crate::environment::Environment;
use crate::util::get_config_dir;

/// Default file name of the application credentials.
pub const APP_CONFIG_FILE: &str = "ebay-config.yaml";

/// Default file name of the test-user credentials.
pub const USER_CONFIG_FILE: &str = "test-config.yaml";

/// Environment variable overriding the application credentials path.
pub const APP_CONFIG_ENV: &str = "EBAY_CONFIG_PATH";

/// Environment variable overriding the test-user credentials path.
pub const USER_CONFIG_ENV: &str = "EBAY_TEST_CONFIG_PATH";

/// Where to look for the two credential files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPaths {
    /// Explicit `ebay-config.yaml` location.
    pub app: Option<PathBuf>,

    /// Explicit `test-config.yaml` location.
    pub user: Option<PathBuf>,
}

impl CredentialPaths {
    /// Resolves the application credentials file.
    #[must_use]
    pub fn resolve_app(&self) -> Option<PathBuf> {
        resolve(self.app.as_deref(), APP_CONFIG_ENV, APP_CONFIG_FILE)
    }

    /// Resolves the test-user credentials file.
    #[must_use]
    pub fn resolve_user(&self) -> Option<PathBuf> {
        resolve(self.user.as_deref(), USER_CONFIG_ENV, USER_CONFIG_FILE)
    }
}

fn resolve(explicit: Option<&Path>, env_var: &str, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(env_var).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(file_name);
    if local.is_file() {
        return Some(local);
    }
    get_config_dir()
        .map(|dir| dir.join(file_name))
        .filter(|path| path.is_file())
}

/// Application and user credentials for one environment.
#[derive(Debug, Clone)]
pub struct CredentialLoader {
    environment: Environment,
    apps: CredentialStore,
    users: UserCredentialStore,
}

impl CredentialLoader {
    /// Loads both credential files for `environment`.
    ///
    /// Never fails: a file that is missing or unreadable leaves the
    /// corresponding side unloaded and logs a warning.
    #[must_use]
    pub fn load(environment: Environment, paths: &CredentialPaths) -> Self {
        let apps = match paths.resolve_app() {
            Some(path) => CredentialStore::load(&path).unwrap_or_else(|e| {
                warn!(error = %e, "Application credentials unavailable");
                CredentialStore::default()
            }),
            None => {
                debug!("No {APP_CONFIG_FILE} found");
                CredentialStore::default()
            }
        };

        let users = match paths.resolve_user() {
            Some(path) => UserCredentialStore::load(&path).unwrap_or_else(|e| {
                warn!(error = %e, "Test user credentials unavailable");
                UserCredentialStore::default()
            }),
            None => {
                debug!("No {USER_CONFIG_FILE} found");
                UserCredentialStore::default()
            }
        };

        Self::from_stores(environment, apps, users)
    }

    /// Builds a loader from already-parsed stores.
    #[must_use]
    pub fn from_stores(
        environment: Environment,
        apps: CredentialStore,
        users: UserCredentialStore,
    ) -> Self {
        Self {
            environment,
            apps,
            users,
        }
    }

    /// The environment this loader was built for.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns true if the environment's application credentials are loaded.
    #[must_use]
    pub fn is_app_credentials_loaded(&self) -> bool {
        self.apps.contains(self.environment)
    }

    /// Returns true if the environment's test user is loaded.
    #[must_use]
    pub fn is_user_credentials_loaded(&self) -> bool {
        self.users.get(self.environment).is_some()
    }

    /// All loaded application credentials.
    #[must_use]
    pub fn apps(&self) -> &CredentialStore {
        &self.apps
    }

    /// The environment's test user, if loaded.
    #[must_use]
    pub fn user(&self) -> Option<&UserCredentials> {
        self.users.get(self.environment)
    }
}
