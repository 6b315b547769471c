//! Bounded polling for page state.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::Element;
use crate::error::{HarnessError, HarnessResult};

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Re-evaluates a condition until it holds or a deadline passes.
///
/// Lookup errors that a page produces while it is still rendering (stale
/// element, no such element) count as "not yet"; any other error ends the
/// wait immediately.
#[derive(Debug, Clone)]
pub struct FluentWait {
    timeout: Duration,
    interval: Duration,
    description: String,
}

impl FluentWait {
    /// Creates a wait with the given total budget.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
            description: "condition".to_string(),
        }
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn polling_every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Names what is awaited, for the timeout message.
    #[must_use]
    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The total budget.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `probe` until it yields `Some`.
    ///
    /// The probe is always attempted at least once, even with a zero budget.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] when the budget runs out, or the
    /// probe's first non-retryable error.
    pub async fn until<T, F, Fut>(&self, mut probe: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_retryable_lookup() => {
                    debug!(what = %self.description, attempt = attempts, error = %e, "Not ready yet");
                }
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(what = %self.description, attempts, "Wait timed out");
                return Err(HarnessError::timeout(&self.description, self.timeout));
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}

/// Waits until `element` is rendered visibly.
///
/// # Errors
///
/// Returns [`HarnessError::Timeout`] if the element stays hidden, or the
/// WebDriver error that made it unusable.
pub async fn wait_until_visible(
    element: &Element<'_>,
    what: &str,
    timeout: Duration,
) -> HarnessResult<()> {
    FluentWait::new(timeout)
        .described_as(format!("{what} to become visible"))
        .until(|| async move { Ok(element.is_displayed().await?.then_some(())) })
        .await
}
