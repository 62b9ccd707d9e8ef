//! Shared test helpers for uihelpers-core integration tests.
//!
//! [`FakeDriver`] is a scripted, in-process [`AutomationDriver`]: it serves a
//! fixed hierarchy, applies scheduled changes once their trigger fires (a
//! delay, or a number of drags), records every gesture, and raises system
//! alerts after a given number of foreground interactions.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use uihelpers_core::config::LaunchConfig;
use uihelpers_core::driver::{AutomationDriver, DriverError};
use uihelpers_core::element::{ElementFrame, ElementRef, ElementType, Point, UIElement};
use uihelpers_core::interruption::{HandlerId, Interruption, InterruptionHandler};

// ---------------------------------------------------------------------------
// Tree builders
// ---------------------------------------------------------------------------

/// An element with an identifier and type.
pub fn el(id: &str, typ: ElementType) -> UIElement {
    UIElement {
        identifier: Some(id.to_string()),
        element_type: Some(typ),
        ..Default::default()
    }
}

/// An element with only a type.
pub fn anon(typ: ElementType) -> UIElement {
    UIElement {
        element_type: Some(typ),
        ..Default::default()
    }
}

pub fn frame(x: f64, y: f64, width: f64, height: f64) -> Option<ElementFrame> {
    Some(ElementFrame { x, y, width, height })
}

/// Builder-style tweaks for test elements.
pub trait ElementExt {
    fn with_children(self, children: Vec<UIElement>) -> Self;
    fn with_frame(self, x: f64, y: f64, width: f64, height: f64) -> Self;
    fn with_label(self, label: &str) -> Self;
    fn with_value(self, value: &str) -> Self;
    fn not_hittable(self) -> Self;
}

impl ElementExt for UIElement {
    fn with_children(mut self, children: Vec<UIElement>) -> Self {
        self.children = children;
        self
    }

    fn with_frame(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.frame = frame(x, y, width, height);
        self
    }

    fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    fn not_hittable(mut self) -> Self {
        self.hittable = Some(false);
        self
    }
}

// ---------------------------------------------------------------------------
// Fake driver
// ---------------------------------------------------------------------------

/// When a scheduled change takes effect.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    /// Once this much (tokio) time has passed since the driver was created.
    After(Duration),
    /// Once this many drags have been performed.
    AfterDrags(u32),
}

/// A change to the served hierarchy.
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert `element` as the last child of the element with identifier
    /// `parent`, or at the root when `parent` is `None`.
    Insert { parent: Option<String>, element: UIElement },
    /// Mark the element with this identifier hittable.
    MakeHittable(String),
    /// Remove the element with this identifier.
    Remove(String),
}

/// A recorded gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Tap(ElementRef),
    TapAt(Point),
    Drag { from: Point, to: Point },
    Type { target: Option<ElementRef>, text: String },
}

struct PendingAlert {
    after_interactions: u32,
    alert: Interruption,
}

struct FakeState {
    created: Instant,
    tree: Vec<UIElement>,
    scheduled: Vec<(Trigger, Change)>,
    gestures: Vec<Gesture>,
    interactions: u32,
    drags: u32,
    alerts: Vec<PendingAlert>,
    alert_taps: Vec<String>,
    handlers: Vec<(HandlerId, String, InterruptionHandler)>,
    next_handler: u64,
    launched: Option<LaunchConfig>,
    select_on_tap: bool,
    dump_calls: u32,
    fail_dumps: bool,
    fail_taps_at: bool,
}

/// Scripted in-process driver. Clones share state, so a test can keep a
/// handle for inspection after giving one to a session.
#[derive(Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new(tree: Vec<UIElement>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                created: Instant::now(),
                tree,
                scheduled: Vec::new(),
                gestures: Vec::new(),
                interactions: 0,
                drags: 0,
                alerts: Vec::new(),
                alert_taps: Vec::new(),
                handlers: Vec::new(),
                next_handler: 1,
                launched: None,
                select_on_tap: false,
                dump_calls: 0,
                fail_dumps: false,
                fail_taps_at: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn schedule(&self, trigger: Trigger, change: Change) {
        self.state().scheduled.push((trigger, change));
    }

    /// Insert `element` under `parent` once `trigger` fires.
    pub fn reveal(&self, trigger: Trigger, parent: Option<&str>, element: UIElement) {
        self.schedule(
            trigger,
            Change::Insert {
                parent: parent.map(str::to_string),
                element,
            },
        );
    }

    /// Raise a system alert on the `after`-th foreground interaction.
    pub fn raise_alert(&self, after: u32, title: &str, buttons: &[&str]) {
        self.state().alerts.push(PendingAlert {
            after_interactions: after,
            alert: Interruption::new(title, buttons.iter().map(|b| b.to_string()).collect()),
        });
    }

    /// Make tapped elements report as selected.
    pub fn select_on_tap(&self) {
        self.state().select_on_tap = true;
    }

    /// Make every hierarchy fetch fail.
    pub fn fail_dumps(&self) {
        self.state().fail_dumps = true;
    }

    /// Make every coordinate tap fail.
    pub fn fail_taps_at(&self) {
        self.state().fail_taps_at = true;
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.state().gestures.clone()
    }

    pub fn taps_at(&self) -> Vec<Point> {
        self.gestures()
            .into_iter()
            .filter_map(|g| match g {
                Gesture::TapAt(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn element_taps(&self) -> Vec<ElementRef> {
        self.gestures()
            .into_iter()
            .filter_map(|g| match g {
                Gesture::Tap(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn drags(&self) -> Vec<(Point, Point)> {
        self.gestures()
            .into_iter()
            .filter_map(|g| match g {
                Gesture::Drag { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Buttons tapped on alerts by handlers.
    pub fn alert_taps(&self) -> Vec<String> {
        self.state().alert_taps.clone()
    }

    pub fn handler_descriptions(&self) -> Vec<String> {
        self.state().handlers.iter().map(|(_, d, _)| d.clone()).collect()
    }

    pub fn launched_with(&self) -> Option<LaunchConfig> {
        self.state().launched.clone()
    }

    pub fn dump_calls(&self) -> u32 {
        self.state().dump_calls
    }

    /// Record a foreground interaction and offer due alerts to the handlers,
    /// most recently registered first.
    fn interact(state: &mut FakeState, gesture: Gesture) {
        if let Gesture::Drag { .. } = gesture {
            state.drags += 1;
        }
        state.gestures.push(gesture);
        state.interactions += 1;

        let interactions = state.interactions;
        let mut remaining = Vec::new();
        for mut pending in std::mem::take(&mut state.alerts) {
            if pending.after_interactions > interactions {
                remaining.push(pending);
                continue;
            }
            let handled = state
                .handlers
                .iter()
                .rev()
                .any(|(_, _, handler)| handler(&mut pending.alert));
            let tapped = pending.alert.tapped_button().map(str::to_string);
            match tapped {
                Some(button) if handled => state.alert_taps.push(button),
                _ => remaining.push(pending),
            }
        }
        state.alerts = remaining;
    }
}

fn apply(tree: &mut Vec<UIElement>, change: &Change) {
    match change {
        Change::Insert { parent: None, element } => tree.push(element.clone()),
        Change::Insert { parent: Some(parent), element } => {
            if let Some(node) = find_mut(tree, parent) {
                node.children.push(element.clone());
            }
        }
        Change::MakeHittable(id) => {
            if let Some(node) = find_mut(tree, id) {
                node.hittable = Some(true);
            }
        }
        Change::Remove(id) => remove(tree, id),
    }
}

fn find_mut<'a>(elements: &'a mut [UIElement], id: &str) -> Option<&'a mut UIElement> {
    for element in elements {
        if element.identifier.as_deref() == Some(id) {
            return Some(element);
        }
        if let Some(found) = find_mut(&mut element.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove(elements: &mut Vec<UIElement>, id: &str) {
    elements.retain(|e| e.identifier.as_deref() != Some(id));
    for element in elements {
        remove(&mut element.children, id);
    }
}

#[async_trait]
impl AutomationDriver for FakeDriver {
    async fn launch(&mut self, config: &LaunchConfig) -> Result<(), DriverError> {
        self.state().launched = Some(config.clone());
        Ok(())
    }

    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError> {
        let mut state = self.state();
        state.dump_calls += 1;
        if state.fail_dumps {
            return Err(DriverError::CommandFailed("hierarchy unavailable".to_string()));
        }
        let elapsed = state.created.elapsed();
        let drags = state.drags;
        let mut tree = state.tree.clone();
        for (trigger, change) in &state.scheduled {
            let due = match *trigger {
                Trigger::After(delay) => elapsed >= delay,
                Trigger::AfterDrags(n) => drags >= n,
            };
            if due {
                apply(&mut tree, change);
            }
        }
        Ok(tree)
    }

    async fn is_selected(&self, target: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state();
        Ok(state.select_on_tap
            && state.gestures.iter().any(|g| matches!(g, Gesture::Tap(t) if t == target)))
    }

    async fn tap(&self, target: &ElementRef) -> Result<(), DriverError> {
        if self.resolve(target).await?.is_none() {
            return Err(DriverError::ElementNotFound(target.to_string()));
        }
        Self::interact(&mut self.state(), Gesture::Tap(target.clone()));
        Ok(())
    }

    async fn tap_at(&self, point: Point) -> Result<(), DriverError> {
        let mut state = self.state();
        if state.fail_taps_at {
            return Err(DriverError::CommandFailed("tap gesture rejected".to_string()));
        }
        Self::interact(&mut state, Gesture::TapAt(point));
        Ok(())
    }

    async fn drag(&self, from: Point, to: Point, _press: Duration) -> Result<(), DriverError> {
        Self::interact(&mut self.state(), Gesture::Drag { from, to });
        Ok(())
    }

    async fn type_text(&self, target: Option<&ElementRef>, text: &str) -> Result<(), DriverError> {
        Self::interact(
            &mut self.state(),
            Gesture::Type {
                target: target.cloned(),
                text: text.to_string(),
            },
        );
        Ok(())
    }

    fn register_interruption_handler(&self, description: &str, handler: InterruptionHandler) -> HandlerId {
        let mut state = self.state();
        let id = HandlerId(state.next_handler);
        state.next_handler += 1;
        state.handlers.push((id, description.to_string(), handler));
        id
    }

    fn unregister_interruption_handler(&self, id: HandlerId) {
        self.state().handlers.retain(|(h, _, _)| *h != id);
    }
}

/// Install a fmt subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
