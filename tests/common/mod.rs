//! Common test utilities and fixtures for the harness.
//!
//! This module provides shared test infrastructure including:
//! - A temporary directory for credential files
//! - Sample `ebay-config.yaml` / `test-config.yaml` contents
//! - Factories for credential stores pointing at mock servers

#![allow(dead_code)]

use std::path::PathBuf;

use ebay_oauth_harness::credentials::{AppCredentials, CredentialStore, UserCredentials};
use ebay_oauth_harness::Environment;
use secrecy::SecretString;

/// Application credentials for both environments.
pub const APP_CONFIG_YAML: &str = "\
name: ebay-config
api.sandbox.ebay.com:
    appid: Harness-Sandbox-SBX-1234
    certid: SBX-0123456789abcdef
    devid: 11111111-2222-3333-4444-555555555555
    redirecturi: Harness_User-HarnessS-Sandbo-abcde
api.ebay.com:
    appid: Harness-Prod-PRD-5678
    certid: PRD-fedcba9876543210
    devid: 11111111-2222-3333-4444-555555555555
    redirecturi: Harness_User-HarnessP-Produc-fghij
";

/// A sandbox test user only.
pub const USER_CONFIG_YAML: &str = "\
sandbox-user:
    username: harness_buyer
    password: sandbox-password
";

/// Test context providing common setup for integration tests.
pub struct TestContext {
    /// Temporary directory for test file operations.
    pub temp_dir: tempfile::TempDir,
}

impl TestContext {
    /// Creates a new test context with a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Returns the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Creates a file in the temporary directory with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("failed to write file");
        path
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A store holding sandbox credentials only.
#[must_use]
pub fn sandbox_store() -> CredentialStore {
    let mut store = CredentialStore::new();
    store.insert(
        Environment::Sandbox,
        AppCredentials::new(
            "Harness-Sandbox-SBX-1234",
            SecretString::new("SBX-0123456789abcdef".into()),
            "dev-id",
            "Harness_User-HarnessS-Sandbo-abcde",
        ),
    );
    store
}

/// The sandbox test user.
#[must_use]
pub fn sandbox_user() -> UserCredentials {
    UserCredentials::new("harness_buyer", SecretString::new("sandbox-password".into()))
}
