//! Automation driver trait.
//!
//! This module defines the [`AutomationDriver`] trait, the capability set every
//! helper in this crate is built on. A driver owns the live UI hierarchy and
//! performs taps, drags and typing against it; the helpers only ever query
//! and command it.
//!
//! Backends implement the required methods. Element queries (`exists`,
//! `is_hittable`, `frame`, `current_value`, ...) have default implementations
//! that fetch the whole hierarchy through [`dump_tree`](AutomationDriver::dump_tree)
//! and search it locally; backends with server-side queries can override them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LaunchConfig;
use crate::element::{resolve_in, ElementFrame, ElementRef, Point, UIElement};
use crate::interruption::{HandlerId, InterruptionHandler};

/// Errors raised by an automation backend.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A command or operation failed with the given message.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The application under test has not been launched.
    #[error("Application not launched")]
    NotLaunched,

    /// The backend could not resolve an element it was asked to act on.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Backend-agnostic UI automation capabilities.
///
/// # Required Methods
///
/// Implementors must provide [`launch`](AutomationDriver::launch),
/// [`dump_tree`](AutomationDriver::dump_tree), [`tap`](AutomationDriver::tap),
/// [`tap_at`](AutomationDriver::tap_at), [`drag`](AutomationDriver::drag),
/// [`type_text`](AutomationDriver::type_text),
/// [`register_interruption_handler`](AutomationDriver::register_interruption_handler)
/// and [`unregister_interruption_handler`](AutomationDriver::unregister_interruption_handler).
///
/// Interruption handlers are invoked by the driver, not by the helpers: a
/// backend checks for a pending system alert whenever it performs a foreground
/// interaction and offers it to the registered handlers, most recent first,
/// until one reports that it handled the alert.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Launch (or relaunch) the application under test with `config`.
    async fn launch(&mut self, config: &LaunchConfig) -> Result<(), DriverError>;

    /// Get the current UI element hierarchy.
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError>;

    /// Resolve a reference against the live hierarchy.
    async fn resolve(&self, target: &ElementRef) -> Result<Option<UIElement>, DriverError> {
        let tree = self.dump_tree().await?;
        Ok(resolve_in(&tree, target))
    }

    /// Whether the target currently exists.
    async fn exists(&self, target: &ElementRef) -> Result<bool, DriverError> {
        Ok(self.resolve(target).await?.is_some())
    }

    /// Whether the target exists and a tap at its position would reach it.
    async fn is_hittable(&self, target: &ElementRef) -> Result<bool, DriverError> {
        Ok(self
            .resolve(target)
            .await?
            .is_some_and(|element| element.is_hittable()))
    }

    /// Whether the target exists and is selected.
    async fn is_selected(&self, target: &ElementRef) -> Result<bool, DriverError> {
        Ok(self
            .resolve(target)
            .await?
            .is_some_and(|element| element.selected == Some(true)))
    }

    /// The target's frame, or `None` if it does not exist or has no frame.
    async fn frame(&self, target: &ElementRef) -> Result<Option<ElementFrame>, DriverError> {
        Ok(self.resolve(target).await?.and_then(|element| element.frame))
    }

    /// The target's current value, or `None` if it has none.
    async fn current_value(&self, target: &ElementRef) -> Result<Option<String>, DriverError> {
        Ok(self.resolve(target).await?.and_then(|element| element.value))
    }

    /// Tap the target element.
    async fn tap(&self, target: &ElementRef) -> Result<(), DriverError>;

    /// Tap at a screen coordinate.
    async fn tap_at(&self, point: Point) -> Result<(), DriverError>;

    /// Press at `from` for `press`, then drag to `to`.
    async fn drag(&self, from: Point, to: Point, press: Duration) -> Result<(), DriverError>;

    /// Type text into `target`, or into the focused element when `None`.
    async fn type_text(&self, target: Option<&ElementRef>, text: &str) -> Result<(), DriverError>;

    /// Register a handler for system interruptions (permission prompts and
    /// other modal alerts). The returned id must be passed to
    /// [`unregister_interruption_handler`](Self::unregister_interruption_handler).
    fn register_interruption_handler(
        &self,
        description: &str,
        handler: InterruptionHandler,
    ) -> HandlerId;

    /// Remove a previously registered handler. Unknown ids are ignored.
    fn unregister_interruption_handler(&self, id: HandlerId);
}

/// Shared driver handle, as held by sessions and interruption guards.
pub type SharedDriver = Arc<dyn AutomationDriver>;
