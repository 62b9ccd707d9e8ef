//! Polling and waiting.
//!
//! [`poll_until`] is the single poll loop every wait in this crate goes
//! through. [`Waiter`] builds the two element waits on top of it:
//!
//! - [`Waiter::wait`] fails loudly with [`HelperError::Timeout`] when the
//!   deadline passes. Use it before interacting with an element.
//! - [`Waiter::probe`] returns `false` on a miss. Use it inside search loops
//!   that decide for themselves what a miss means.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{trace, warn};

use crate::driver::{AutomationDriver, DriverError};
use crate::element::ElementRef;
use crate::error::HelperError;

/// Default timeout for element waits (15 seconds)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interval and deadline for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}

/// Result of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The check produced a value before the deadline.
    Ready(T),
    /// The deadline passed without the check producing a value.
    TimedOut { elapsed: Duration },
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::TimedOut { .. } => None,
        }
    }
}

/// Runs `check` until it yields `Some`, or until `policy.timeout` has elapsed.
///
/// The first check runs immediately. Sleeps are clipped to the remaining time
/// so the final check happens at the deadline, never after it. A zero timeout
/// checks exactly once. Errors from `check` end the loop immediately.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut check: F) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();
    let deadline = start + policy.timeout;
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        if let Some(value) = check().await? {
            trace!(polls, elapsed_ms = start.elapsed().as_millis() as u64, "poll ready");
            return Ok(PollOutcome::Ready(value));
        }

        let now = Instant::now();
        if now >= deadline {
            trace!(polls, "poll timed out");
            return Ok(PollOutcome::TimedOut {
                elapsed: now - start,
            });
        }
        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}

/// What a wait requires of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    Exists,
    Hittable,
    Absent,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exists => "exist",
            Self::Hittable => "become hittable",
            Self::Absent => "disappear",
        })
    }
}

/// Per-call wait parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    /// Require the element to be hittable, not just present.
    pub require_hittable: bool,
}

impl WaitConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            require_hittable: false,
        }
    }

    #[must_use]
    pub fn hittable(mut self) -> Self {
        self.require_hittable = true;
        self
    }

    pub fn condition(&self) -> WaitCondition {
        if self.require_hittable {
            WaitCondition::Hittable
        } else {
            WaitCondition::Exists
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}

/// Element waits against a driver.
pub struct Waiter<'a> {
    driver: &'a dyn AutomationDriver,
    interval: Duration,
}

impl<'a> Waiter<'a> {
    pub fn new(driver: &'a dyn AutomationDriver) -> Self {
        Self {
            driver,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    async fn satisfied(&self, target: &ElementRef, require_hittable: bool) -> Result<Option<()>, DriverError> {
        let ok = if require_hittable {
            self.driver.is_hittable(target).await?
        } else {
            self.driver.exists(target).await?
        };
        Ok(ok.then_some(()))
    }

    /// Waits until `target` exists (and is hittable, if required).
    ///
    /// Returns [`HelperError::Timeout`] naming the target when the deadline
    /// passes. Callers must not go on to interact with the target after that.
    pub async fn wait(&self, target: &ElementRef, config: WaitConfig) -> Result<(), HelperError> {
        let policy = PollPolicy::new(config.timeout).with_interval(self.interval);
        let outcome = poll_until(policy, move || self.satisfied(target, config.require_hittable)).await?;
        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::TimedOut { elapsed } => {
                warn!(%target, condition = %config.condition(), "wait timed out");
                Err(HelperError::Timeout {
                    target: target.to_string(),
                    condition: config.condition(),
                    elapsed_ms: elapsed.as_millis() as u64,
                })
            }
        }
    }

    /// Checks for `target` for at most `timeout`. A miss is `Ok(false)`.
    pub async fn probe(
        &self,
        target: &ElementRef,
        timeout: Duration,
        require_hittable: bool,
    ) -> Result<bool, DriverError> {
        let policy = PollPolicy::new(timeout).with_interval(self.interval);
        let outcome = poll_until(policy, move || self.satisfied(target, require_hittable)).await?;
        Ok(outcome.is_ready())
    }

    /// Waits until `target` no longer exists. An element that is still in the
    /// hierarchy but covered does not count as gone.
    pub async fn wait_for_absence(&self, target: &ElementRef, timeout: Duration) -> Result<(), HelperError> {
        let policy = PollPolicy::new(timeout).with_interval(self.interval);
        let driver = self.driver;
        let outcome = poll_until(policy, move || async move {
            let present = driver.exists(target).await?;
            Ok::<_, DriverError>((!present).then_some(()))
        })
        .await?;
        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::TimedOut { elapsed } => Err(HelperError::Timeout {
                target: target.to_string(),
                condition: WaitCondition::Absent,
                elapsed_ms: elapsed.as_millis() as u64,
            }),
        }
    }
}
