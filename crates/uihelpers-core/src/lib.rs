//! # uihelpers-core
//!
//! Convenience helpers for UI tests, built on an [`AutomationDriver`]
//! supplied by the caller. The driver owns the live UI hierarchy; this crate
//! only polls it and sends it gestures.
//!
//! ## Modules
//!
//! - [`driver`] - The automation driver trait every helper is built on
//! - [`element`] - Element references, hierarchy snapshots and geometry
//! - [`wait`] - The poll loop and element waits
//! - [`scroll`] - Bounded scroll-until-visible search
//! - [`interruption`] - System alert handlers and the provoking tap loop
//! - [`lookup`] - Identifier lookup across prioritised element types
//! - [`session`] - Per-test session exposing all helpers
//! - [`config`] - Timing defaults and launch options
//! - [`action`] - Journal of helper calls
//! - [`error`] - Helper error type
//!
//! [`AutomationDriver`]: driver::AutomationDriver

pub mod action;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod interruption;
pub mod lookup;
pub mod scroll;
pub mod session;
pub mod wait;
