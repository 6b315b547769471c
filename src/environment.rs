//! eBay API environments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// The two eBay environments an application can be registered in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// `api.sandbox.ebay.com`, the test environment.
    #[default]
    Sandbox,

    /// `api.ebay.com`, the live marketplace.
    Production,
}

impl Environment {
    /// Returns every environment, sandbox first.
    #[must_use]
    pub const fn all() -> [Environment; 2] {
        [Environment::Sandbox, Environment::Production]
    }

    /// The key this environment's entry is stored under in `ebay-config.yaml`.
    #[must_use]
    pub const fn config_id(self) -> &'static str {
        match self {
            Self::Sandbox => "api.sandbox.ebay.com",
            Self::Production => "api.ebay.com",
        }
    }

    /// The user consent page the browser is sent to.
    #[must_use]
    pub const fn web_endpoint(self) -> &'static str {
        match self {
            Self::Sandbox => "https://auth.sandbox.ebay.com/oauth2/authorize",
            Self::Production => "https://auth.ebay.com/oauth2/authorize",
        }
    }

    /// The token endpoint for code exchange and refresh.
    #[must_use]
    pub const fn api_endpoint(self) -> &'static str {
        match self {
            Self::Sandbox => "https://api.sandbox.ebay.com/identity/v1/oauth2/token",
            Self::Production => "https://api.ebay.com/identity/v1/oauth2/token",
        }
    }

    /// The key this environment's test user is stored under in `test-config.yaml`.
    #[must_use]
    pub const fn user_key(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox-user",
            Self::Production => "production-user",
        }
    }

    /// Looks up an environment by its `ebay-config.yaml` key.
    #[must_use]
    pub fn from_config_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|env| env.config_id() == id)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => f.write_str("SANDBOX"),
            Self::Production => f.write_str("PRODUCTION"),
        }
    }
}

impl FromStr for Environment {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Self::from_config_id(other).ok_or_else(|| HarnessError::InvalidConfig {
                key: "environment".to_string(),
                message: format!("unknown environment '{s}' (expected sandbox or production)"),
            }),
        }
    }
}
