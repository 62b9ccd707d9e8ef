//! Error types for helper operations.

use thiserror::Error;

use crate::driver::DriverError;
use crate::element::ElementType;
use crate::wait::WaitCondition;

/// Errors returned by the helpers.
///
/// Every variant names the element involved, so a failing test reports which
/// target and which operation gave up. Probe misses inside search loops are
/// not errors and never surface here.
#[derive(Error, Debug)]
pub enum HelperError {
    /// A wait exceeded its deadline.
    #[error("Timeout after {elapsed_ms}ms waiting for {target} to {condition}")]
    Timeout {
        target: String,
        condition: WaitCondition,
        elapsed_ms: u64,
    },

    /// No element category in the lookup table held the identifier.
    #[error("No element with identifier '{identifier}' found (tried: {})", join_types(.attempted))]
    Lookup {
        identifier: String,
        attempted: Vec<ElementType>,
    },

    /// An element needed by an operation could not be resolved.
    #[error("{target} not found while trying to {operation}")]
    ElementMissing {
        target: String,
        operation: &'static str,
    },

    /// A scroll search used up its budget without reaching the target.
    #[error("{target} not reachable after {iterations} scroll gestures")]
    ScrollExhausted { target: String, iterations: u32 },

    /// A value read from an element did not have the expected shape.
    #[error("Expected {expected} from {target}, got {found}")]
    TypeMismatch {
        target: String,
        expected: &'static str,
        found: String,
    },

    /// A post-condition on an element did not hold.
    #[error("Assertion failed on {target}: {message}")]
    Assertion { target: String, message: String },

    /// The driver failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

fn join_types(types: &[ElementType]) -> String {
    types
        .iter()
        .map(ElementType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
