//! Scroll a container until a target element becomes reachable.
//!
//! Each iteration drags from the container's centre by the
//! [`ScrollDirection`] vector, then probes the target with a short timeout.
//! The search stops after `max_iterations` drags (and, optionally, after
//! `max_elapsed`), so a target that never renders cannot hang the test.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::driver::AutomationDriver;
use crate::element::{ElementRef, Vector};
use crate::error::HelperError;
use crate::wait::Waiter;

/// Default drag distance in points.
pub const DEFAULT_SCROLL_MAGNITUDE: f64 = 250.0;

/// Press duration before each drag.
pub const DRAG_PRESS_DURATION: Duration = Duration::from_millis(10);

/// Scroll direction and drag distance.
///
/// Directions name where the content should move into view, so the drag runs
/// the opposite way: `Down` drags upwards (negative y), `Right` drags leftwards
/// (negative x). The magnitude's sign is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "magnitude", rename_all = "lowercase")]
pub enum ScrollDirection {
    Up(f64),
    Down(f64),
    Left(f64),
    Right(f64),
}

impl ScrollDirection {
    pub fn magnitude(&self) -> f64 {
        match *self {
            Self::Up(m) | Self::Down(m) | Self::Left(m) | Self::Right(m) => m.abs(),
        }
    }

    /// The drag offset applied to the container's centre.
    pub fn vector(&self) -> Vector {
        let m = self.magnitude();
        match self {
            Self::Down(_) => Vector { dx: 0.0, dy: -m },
            Self::Up(_) => Vector { dx: 0.0, dy: m },
            Self::Right(_) => Vector { dx: -m, dy: 0.0 },
            Self::Left(_) => Vector { dx: m, dy: 0.0 },
        }
    }
}

impl Default for ScrollDirection {
    fn default() -> Self {
        Self::Down(DEFAULT_SCROLL_MAGNITUDE)
    }
}

/// Budget for one scroll search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPolicy {
    pub direction: ScrollDirection,
    /// How long to probe for the target after each drag.
    pub probe_timeout: Duration,
    /// Maximum number of drags.
    pub max_iterations: u32,
    /// Optional cap on the whole search.
    pub max_elapsed: Option<Duration>,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            direction: ScrollDirection::default(),
            probe_timeout: Duration::from_secs(1),
            max_iterations: 50,
            max_elapsed: None,
        }
    }
}

/// How a successful search went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    /// Drags performed before the target became hittable.
    pub drags: u32,
}

/// Drags `container` until `target` exists and is hittable.
///
/// Checks the target once before the first drag, so an already visible target
/// costs no gestures.
pub async fn scroll_to_element(
    driver: &dyn AutomationDriver,
    container: &ElementRef,
    target: &ElementRef,
    policy: ScrollPolicy,
) -> Result<ScrollReport, HelperError> {
    if driver.is_hittable(target).await? {
        return Ok(ScrollReport { drags: 0 });
    }

    let waiter = Waiter::new(driver);
    let offset = policy.direction.vector();
    let start = Instant::now();
    let mut drags = 0;

    while drags < policy.max_iterations {
        if policy.max_elapsed.is_some_and(|limit| start.elapsed() >= limit) {
            debug!(%target, drags, "scroll search hit elapsed limit");
            break;
        }

        let frame = driver
            .frame(container)
            .await?
            .ok_or_else(|| HelperError::ElementMissing {
                target: container.to_string(),
                operation: "scroll",
            })?;
        let from = frame.center();
        driver.drag(from, from.offset_by(offset), DRAG_PRESS_DURATION).await?;
        drags += 1;
        debug!(%target, drags, dx = offset.dx, dy = offset.dy, "scrolled");

        if waiter.probe(target, policy.probe_timeout, true).await? {
            return Ok(ScrollReport { drags });
        }
    }

    warn!(%target, %container, drags, "scroll search exhausted");
    Err(HelperError::ScrollExhausted {
        target: target.to_string(),
        iterations: drags,
    })
}
