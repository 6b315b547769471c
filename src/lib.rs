//! eBay OAuth harness
//!
//! Drives eBay's OAuth 2.0 authorization-code and refresh-token grants end to
//! end: a real browser signs a test user in through a WebDriver server, the
//! authorization code is read off the redirect, and the token endpoint is
//! called to exchange and refresh it.
//!
//! This library exposes the building blocks for the CLI and the test suites.

pub mod browser;
pub mod code;
pub mod config;
pub mod consent;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod oauth;
pub mod util;

// Re-export core types for convenient access
pub use environment::Environment;
pub use error::{HarnessError, HarnessResult};
pub use oauth::{OAuth2Api, OAuthResponse};
