//! Minimal W3C WebDriver client.
//!
//! Drives a browser through an external WebDriver server (chromedriver,
//! geckodriver, a Selenium grid) using the JSON wire format of the W3C
//! WebDriver specification. Only the commands the consent flow needs are
//! implemented.
//!
//! # Example
//!
//! ```no_run
//! use ebay_oauth_harness::browser::{BrowserOptions, Locator, WebDriver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let driver = WebDriver::connect("http://localhost:9515", &BrowserOptions::default()).await?;
//!     driver.goto("https://auth.sandbox.ebay.com/").await?;
//!     let field = driver.find(&Locator::css("input[type='text']")).await?;
//!     field.send_keys("testuser").await?;
//!     driver.quit().await?;
//!     Ok(())
//! }
//! ```

pub mod wait;

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};

pub use self::wait::{wait_until_visible, FluentWait};

/// JSON key identifying a web element reference.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// chromedriver's default listen address.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Upper bound on a single WebDriver command, page loads included.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Submits the element's form, or clicks the element when it has none.
const SUBMIT_SCRIPT: &str = "\
var el = arguments[0];
var form = el.form || (el.closest ? el.closest('form') : null);
if (form) {
    if (form.requestSubmit) { form.requestSubmit(); } else { form.submit(); }
} else {
    el.click();
}";

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A CSS selector.
    Css(String),
    /// The element's `name` attribute.
    Name(String),
    /// The element's `id` attribute.
    Id(String),
}

impl Locator {
    /// Locates by CSS selector.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locates by `name` attribute.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Locates by `id` attribute.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// The CSS selector sent to the server.
    ///
    /// W3C WebDriver dropped the `name` and `id` strategies, so both are
    /// expressed as attribute selectors.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Css(selector) => selector.clone(),
            Self::Name(name) => format!("[name=\"{}\"]", css_escape(name)),
            Self::Id(id) => format!("[id=\"{}\"]", css_escape(id)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css {selector}"),
            Self::Name(name) => write!(f, "name {name}"),
            Self::Id(id) => write!(f, "id {id}"),
        }
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Browser settings requested when a session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Browser name capability.
    pub browser_name: String,

    /// Run without a visible window.
    pub headless: bool,

    /// Extra command-line switches passed to Chrome.
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            browser_name: "chrome".to_string(),
            headless: false,
            args: Vec::new(),
        }
    }
}

impl BrowserOptions {
    /// Returns options for a headless browser.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Self::default()
        }
    }

    /// The `capabilities` object of a new-session request.
    #[must_use]
    pub fn to_capabilities(&self) -> Value {
        let mut args = self.args.clone();
        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--window-size=1280,1024".to_string());
        }
        json!({
            "alwaysMatch": {
                "browserName": self.browser_name,
                "goog:chromeOptions": { "args": args },
            }
        })
    }
}

/// Envelope every WebDriver reply is wrapped in.
#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

/// An open browser session.
///
/// Sessions are not closed on drop; call [`quit`](Self::quit).
#[derive(Debug)]
pub struct WebDriver {
    http: reqwest::Client,
    server_url: String,
    session_id: String,
}

impl WebDriver {
    /// Starts a new browser session on the server at `server_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or refuses the session.
    pub async fn connect(server_url: &str, options: &BrowserOptions) -> HarnessResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()?;
        let server_url = server_url.trim_end_matches('/').to_string();

        let session: NewSession = send(
            &http,
            "new session",
            Method::POST,
            format!("{server_url}/session"),
            Some(json!({ "capabilities": options.to_capabilities() })),
        )
        .await?;

        info!(session = %session.session_id, server = %server_url, "Started browser session");
        Ok(Self {
            http,
            server_url,
            session_id: session.session_id,
        })
    }

    /// The server-assigned session id.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command<T: DeserializeOwned>(
        &self,
        name: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> HarnessResult<T> {
        let url = format!("{}/session/{}{}", self.server_url, self.session_id, path);
        send(&self.http, name, method, url, body).await
    }

    /// Navigates to `url` and waits for the page load the server reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the navigation.
    pub async fn goto(&self, url: &str) -> HarnessResult<()> {
        debug!(url = %url, "Navigating");
        let _: Value = self
            .command("navigate to", Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// The URL of the current page.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot report the URL.
    pub async fn current_url(&self) -> HarnessResult<String> {
        self.command("get current url", Method::GET, "/url", None)
            .await
    }

    /// Finds the first element matching `locator`.
    ///
    /// # Errors
    ///
    /// Returns a WebDriver error (`no such element` when nothing matches).
    pub async fn find(&self, locator: &Locator) -> HarnessResult<Element<'_>> {
        let reference: Value = self
            .command(
                "find element",
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": locator.to_css() })),
            )
            .await?;
        let id = reference
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| HarnessError::WebDriverProtocol {
                command: "find element",
                message: format!("reply is not an element reference: {reference}"),
            })?;
        debug!(locator = %locator, element = %id, "Found element");
        Ok(Element {
            driver: self,
            id: id.to_string(),
        })
    }

    /// Ends the session and closes the browser.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to delete the session.
    pub async fn quit(self) -> HarnessResult<()> {
        let _: Value = self
            .command("delete session", Method::DELETE, "", None)
            .await?;
        info!(session = %self.session_id, "Closed browser session");
        Ok(())
    }
}

/// A reference to an element of the current page.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    driver: &'a WebDriver,
    id: String,
}

impl Element<'_> {
    /// The server-assigned element id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn reference(&self) -> Value {
        let mut reference = serde_json::Map::new();
        reference.insert(ELEMENT_KEY.to_string(), Value::String(self.id.clone()));
        Value::Object(reference)
    }

    /// Types `text` into the element.
    ///
    /// # Errors
    ///
    /// Returns a WebDriver error if the element is gone or not interactable.
    pub async fn send_keys(&self, text: &str) -> HarnessResult<()> {
        let _: Value = self
            .driver
            .command(
                "element send keys",
                Method::POST,
                &format!("/element/{}/value", self.id),
                Some(json!({ "text": text })),
            )
            .await?;
        Ok(())
    }

    /// Clicks the element.
    ///
    /// # Errors
    ///
    /// Returns a WebDriver error if the element is gone or not interactable.
    pub async fn click(&self) -> HarnessResult<()> {
        let _: Value = self
            .driver
            .command(
                "element click",
                Method::POST,
                &format!("/element/{}/click", self.id),
                Some(json!({})),
            )
            .await?;
        Ok(())
    }

    /// Submits the form the element belongs to.
    ///
    /// # Errors
    ///
    /// Returns a WebDriver error if the script cannot run.
    pub async fn submit(&self) -> HarnessResult<()> {
        let _: Value = self
            .driver
            .command(
                "execute script",
                Method::POST,
                "/execute/sync",
                Some(json!({ "script": SUBMIT_SCRIPT, "args": [self.reference()] })),
            )
            .await?;
        Ok(())
    }

    /// Returns true if the element is rendered visibly.
    ///
    /// # Errors
    ///
    /// Returns a WebDriver error if the element is gone.
    pub async fn is_displayed(&self) -> HarnessResult<bool> {
        self.driver
            .command(
                "is element displayed",
                Method::GET,
                &format!("/element/{}/displayed", self.id),
                None,
            )
            .await
    }
}

/// Sends one command and unwraps the `value` of the reply.
async fn send<T: DeserializeOwned>(
    http: &reqwest::Client,
    name: &'static str,
    method: Method,
    url: String,
    body: Option<Value>,
) -> HarnessResult<T> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    let reply: Reply = serde_json::from_str(&text).map_err(|e| HarnessError::WebDriverProtocol {
        command: name,
        message: format!("status {status}: {e}"),
    })?;

    if let Some(error) = reply.value.get("error").and_then(Value::as_str) {
        let message = reply
            .value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(HarnessError::webdriver(name, error, message));
    }
    if !status.is_success() {
        return Err(HarnessError::WebDriverProtocol {
            command: name,
            message: format!("status {status} without an error payload"),
        });
    }

    serde_json::from_value(reply.value).map_err(|e| HarnessError::WebDriverProtocol {
        command: name,
        message: e.to_string(),
    })
}
