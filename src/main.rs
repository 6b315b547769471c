//! ebay-oauth-harness - drive eBay's OAuth consent flow from the command line

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ebay_oauth_harness::config::{parse_duration, HarnessConfig, PAGE_SETTLE_ENV};
use ebay_oauth_harness::consent::ConsentFlow;
use ebay_oauth_harness::credentials::{CredentialLoader, CredentialPaths};
use ebay_oauth_harness::oauth::{generate_state, OAuth2Api, DEFAULT_SCOPES, DEFAULT_STATE};
use ebay_oauth_harness::Environment;

#[derive(Parser, Debug)]
#[command(name = "ebay-oauth-harness")]
#[command(about = "Drive eBay's OAuth authorization-code and refresh-token grants")]
#[command(version)]
struct Args {
    /// Environment to authorize against (sandbox, production or a config id)
    #[arg(short, long, value_parser = parse_environment, env = "EBAY_TEST_ENV")]
    env: Option<Environment>,

    /// Path of ebay-config.yaml (application credentials)
    #[arg(long, env = "EBAY_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Path of test-config.yaml (test user credentials)
    #[arg(long, env = "EBAY_TEST_CONFIG_PATH")]
    test_config: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long, env = "WEBDRIVER_URL")]
    webdriver: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the loaded application credentials (cert ids masked)
    DumpConfig,

    /// Print the consent page URL for the configured application
    AuthorizeUrl {
        /// Scope to request (repeatable, defaults to the harness scopes)
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// State echoed back on the redirect
        #[arg(long, default_value = DEFAULT_STATE)]
        state: String,
    },

    /// Sign the test user in through a browser and exchange the code
    Login {
        /// Scope to request (repeatable, defaults to the harness scopes)
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// State echoed back on the redirect (random when omitted)
        #[arg(long)]
        state: Option<String>,

        /// Hide the browser window
        #[arg(long)]
        headless: bool,

        /// Pause after each page navigation, e.g. "5s"
        #[arg(long, value_name = "DURATION")]
        page_settle: Option<String>,
    },

    /// Exchange a refresh token for a new access token
    Refresh {
        /// The refresh token (or set EBAY_REFRESH_TOKEN)
        #[arg(long, env = "EBAY_REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: SecretString,

        /// Scope to request (repeatable, defaults to the harness scopes)
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
}

fn parse_environment(value: &str) -> Result<Environment, ebay_oauth_harness::HarnessError> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let mut config = HarnessConfig::from_env().context("Invalid harness configuration")?;
    if let Some(env) = args.env {
        config.environment = env;
    }
    config.credential_paths = CredentialPaths {
        app: args.config.or(config.credential_paths.app),
        user: args.test_config.or(config.credential_paths.user),
    };
    if let Some(url) = args.webdriver {
        config.webdriver_url = url;
    }

    let credentials = CredentialLoader::load(config.environment, &config.credential_paths);

    match args.command {
        Command::DumpConfig => dump_config(&credentials),
        Command::AuthorizeUrl { scopes, state } => {
            authorize_url(&config, &credentials, &scopes_or_default(scopes), &state)
        }
        Command::Login {
            scopes,
            state,
            headless,
            page_settle,
        } => {
            if headless {
                config.browser.headless = true;
            }
            if let Some(settle) = page_settle {
                config.timings.page_settle = parse_duration(PAGE_SETTLE_ENV, &settle)?;
            }
            let state = state.unwrap_or_else(generate_state);
            login(&config, &credentials, scopes_or_default(scopes), state).await
        }
        Command::Refresh {
            refresh_token,
            scopes,
        } => {
            refresh(
                &config,
                &credentials,
                &refresh_token,
                &scopes_or_default(scopes),
            )
            .await
        }
    }
}

fn scopes_or_default(scopes: Vec<String>) -> Vec<String> {
    if scopes.is_empty() {
        DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect()
    } else {
        scopes
    }
}

fn require_app_credentials(config: &HarnessConfig, credentials: &CredentialLoader) -> Result<()> {
    if !credentials.is_app_credentials_loaded() {
        bail!(
            "No application credentials for {}. Check that ebay-config.yaml is set up correctly \
             (or pass --config / set EBAY_CONFIG_PATH).",
            config.environment
        );
    }
    Ok(())
}

fn dump_config(credentials: &CredentialLoader) -> Result<()> {
    if credentials.apps().is_empty() {
        bail!("No application credentials loaded. Check that ebay-config.yaml is set up correctly.");
    }
    print!("{}", credentials.apps().dump());
    Ok(())
}

fn authorize_url(
    config: &HarnessConfig,
    credentials: &CredentialLoader,
    scopes: &[String],
    state: &str,
) -> Result<()> {
    require_app_credentials(config, credentials)?;
    let api = OAuth2Api::new(credentials.apps().clone());
    let url = api.generate_user_authorization_url(config.environment, scopes, Some(state))?;
    println!("{url}");
    Ok(())
}

async fn login(
    config: &HarnessConfig,
    credentials: &CredentialLoader,
    scopes: Vec<String>,
    state: String,
) -> Result<()> {
    require_app_credentials(config, credentials)?;
    let user = credentials.user().cloned().with_context(|| {
        format!(
            "No test user for {}. Check that test-config.yaml is set up correctly \
             (or pass --test-config / set EBAY_TEST_CONFIG_PATH).",
            config.environment
        )
    })?;

    let api = OAuth2Api::new(credentials.apps().clone());
    let code = ConsentFlow::new(&api, user, config)
        .with_scopes(scopes)
        .with_state(Some(state))
        .authorization_code()
        .await
        .context("Browser sign-in failed")?
        .context("The redirect URL did not carry an authorization code")?;

    let response = api
        .exchange_code_for_access_token(config.environment, &code)
        .await
        .context("Token exchange failed")?;
    if let Some(error) = response.error_message() {
        bail!("Token exchange rejected: {error}");
    }
    info!("Token exchange completed");
    println!("{response}");
    Ok(())
}

async fn refresh(
    config: &HarnessConfig,
    credentials: &CredentialLoader,
    refresh_token: &SecretString,
    scopes: &[String],
) -> Result<()> {
    require_app_credentials(config, credentials)?;
    let api = OAuth2Api::new(credentials.apps().clone());
    let response = api
        .get_access_token(config.environment, refresh_token.expose_secret(), scopes)
        .await
        .context("Token refresh failed")?;
    if let Some(error) = response.error_message() {
        bail!("Token refresh rejected: {error}");
    }
    info!("Refresh to access completed");
    println!("{response}");
    Ok(())
}
