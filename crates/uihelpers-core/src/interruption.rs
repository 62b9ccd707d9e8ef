//! System alert (interruption) handling.
//!
//! Drivers only offer a pending system alert to registered handlers when they
//! perform a foreground interaction. [`tap_until_alert_handled`] therefore
//! registers a handler and keeps tapping an inert point until the handler
//! reports that it dismissed the alert, or the retries run out.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::driver::{DriverError, SharedDriver};
use crate::element::Point;

/// A modal system alert offered to interruption handlers.
///
/// Handlers inspect the buttons and choose one with [`tap_button`](Self::tap_button);
/// the driver performs the chosen tap after the handler returns `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interruption {
    pub title: String,
    pub buttons: Vec<String>,
    tapped: Option<String>,
}

impl Interruption {
    pub fn new(title: impl Into<String>, buttons: Vec<String>) -> Self {
        Self {
            title: title.into(),
            buttons,
            tapped: None,
        }
    }

    pub fn has_button(&self, name: &str) -> bool {
        self.buttons.iter().any(|b| b == name)
    }

    /// Selects `name` to be tapped. Returns false if the alert has no such button.
    pub fn tap_button(&mut self, name: &str) -> bool {
        if self.has_button(name) {
            self.tapped = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// The button a handler selected, if any.
    pub fn tapped_button(&self) -> Option<&str> {
        self.tapped.as_deref()
    }
}

/// A handler invoked by the driver with a pending alert. Returns true when it
/// handled the alert.
pub type InterruptionHandler = Arc<dyn Fn(&mut Interruption) -> bool + Send + Sync>;

/// Registration handle returned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Keeps an interruption handler registered for as long as it lives.
pub struct InterruptionGuard {
    driver: SharedDriver,
    id: HandlerId,
}

impl InterruptionGuard {
    /// Registers `handler` with `driver`.
    pub fn register(
        driver: SharedDriver,
        description: &str,
        handler: InterruptionHandler,
    ) -> Self {
        let id = driver.register_interruption_handler(description, handler);
        debug!(%id, description, "interruption handler registered");
        Self { driver, id }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }
}

impl Drop for InterruptionGuard {
    fn drop(&mut self) {
        self.driver.unregister_interruption_handler(self.id);
        debug!(id = %self.id, "interruption handler unregistered");
    }
}

/// A handler that taps the first button present from `buttons`, in order.
pub fn tap_first_of(buttons: Vec<String>) -> InterruptionHandler {
    Arc::new(move |alert: &mut Interruption| {
        buttons.iter().any(|name| alert.tap_button(name))
    })
}

/// The buttons the default popup handler accepts: notification and photo
/// permission prompts, plus the German "done" used by photo pickers.
pub fn default_popup_buttons() -> Vec<String> {
    vec!["Allow".to_string(), "OK".to_string(), "Fertig".to_string()]
}

/// Result of [`tap_until_alert_handled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertOutcome {
    /// The handler dismissed the alert after `taps` provoking taps.
    Handled { taps: u32 },
    /// No matching alert was dismissed. `alerts_seen` counts alerts the
    /// handler was offered but that lacked the requested button.
    TimedOut { taps: u32, alerts_seen: u32 },
}

impl AlertOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }

    pub fn taps(&self) -> u32 {
        match *self {
            Self::Handled { taps } | Self::TimedOut { taps, .. } => taps,
        }
    }
}

/// Pacing for [`tap_until_alert_handled`].
#[derive(Debug, Clone, Copy)]
pub struct AlertTapPolicy {
    /// How long to keep provoking the driver.
    pub timeout: Duration,
    /// Pause before each provoking tap.
    pub interval: Duration,
    /// Inert point to tap. Should not trigger anything in the app.
    pub tap_point: Point,
}

impl AlertTapPolicy {
    /// Number of provoking taps: `ceil(timeout / interval)`, at least one.
    pub fn attempts(&self) -> u32 {
        let interval = self.interval.as_millis().max(1);
        let attempts = self.timeout.as_millis().div_ceil(interval).max(1);
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }
}

/// Waits for a system alert and taps its button titled `button`.
///
/// Registers a temporary handler, then repeatedly sleeps one interval and taps
/// the inert point so the driver checks for interruptions. Returns as soon as
/// the handler reports success; the handler is unregistered on every exit path.
pub async fn tap_until_alert_handled(
    driver: &SharedDriver,
    button: &str,
    policy: AlertTapPolicy,
) -> Result<AlertOutcome, DriverError> {
    let handled = Arc::new(AtomicBool::new(false));
    let alerts_seen = Arc::new(AtomicU32::new(0));

    let handler: InterruptionHandler = {
        let handled = handled.clone();
        let alerts_seen = alerts_seen.clone();
        let button = button.to_string();
        Arc::new(move |alert: &mut Interruption| {
            if alert.tap_button(&button) {
                handled.store(true, Ordering::SeqCst);
                true
            } else {
                alerts_seen.fetch_add(1, Ordering::SeqCst);
                false
            }
        })
    };
    let _guard = InterruptionGuard::register(
        driver.clone(),
        &format!("tap '{}' on alert", button),
        handler,
    );

    let attempts = policy.attempts();
    for tap in 1..=attempts {
        tokio::time::sleep(policy.interval).await;
        driver.tap_at(policy.tap_point).await?;
        debug!(tap, attempts, button, "provoking tap");
        if handled.load(Ordering::SeqCst) {
            return Ok(AlertOutcome::Handled { taps: tap });
        }
    }

    let alerts_seen = alerts_seen.load(Ordering::SeqCst);
    warn!(button, taps = attempts, alerts_seen, "no alert button tapped before timeout");
    Ok(AlertOutcome::TimedOut {
        taps: attempts,
        alerts_seen,
    })
}
