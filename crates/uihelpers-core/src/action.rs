//! Helper actions and the session journal.
//!
//! Every helper call made through a [`UiSession`](crate::session::UiSession)
//! is recorded as an [`ActionLog`] so that a failing test can show what ran
//! before it.
//!
//! # Example
//!
//! ```
//! use uihelpers_core::action::{ActionLog, ActionResult, HelperAction};
//!
//! let action = HelperAction::TapButton { name: "Continue".to_string() };
//! let log = ActionLog::new(action, ActionResult::Success, Some(12));
//! println!("Action {} at {}", log.id, log.timestamp);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The result of a helper call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionResult {
    Success,
    Failure(String),
}

/// Helper operations, as recorded in the journal.
///
/// Element targets are stored in their display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HelperAction {
    WaitFor {
        target: String,
        timeout_ms: u64,
        require_hittable: bool,
    },
    WaitForAbsence {
        target: String,
        timeout_ms: u64,
    },
    ScrollTo {
        container: String,
        target: String,
    },
    TapElement {
        target: String,
    },
    TapCenter {
        target: String,
    },
    TapButton {
        name: String,
    },
    TapImage {
        name: String,
    },
    TapIdentified {
        identifier: String,
    },
    TapCell {
        index: usize,
        assert_selected: bool,
    },
    TapDisclosureIndicator {
        index: usize,
    },
    SelectCell {
        name: String,
        collection: String,
    },
    PickerSubmit,
    TapAlertButton {
        name: String,
        timeout_ms: u64,
    },
    ShowKeyboard,
    HideKeyboard,
    TypeOnKeyboard {
        text: String,
    },
    TypeInto {
        target: String,
        text: String,
    },
    GetValue {
        target: String,
    },
}

impl HelperAction {
    /// Short static name for tracing spans.
    pub fn name(&self) -> &'static str {
        match self {
            HelperAction::WaitFor { .. } => "wait_for",
            HelperAction::WaitForAbsence { .. } => "wait_for_absence",
            HelperAction::ScrollTo { .. } => "scroll_to",
            HelperAction::TapElement { .. } => "tap_element",
            HelperAction::TapCenter { .. } => "tap_center",
            HelperAction::TapButton { .. } => "tap_button",
            HelperAction::TapImage { .. } => "tap_image",
            HelperAction::TapIdentified { .. } => "tap_identified",
            HelperAction::TapCell { .. } => "tap_cell",
            HelperAction::TapDisclosureIndicator { .. } => "tap_disclosure_indicator",
            HelperAction::SelectCell { .. } => "select_cell",
            HelperAction::PickerSubmit => "picker_submit",
            HelperAction::TapAlertButton { .. } => "tap_alert_button",
            HelperAction::ShowKeyboard => "show_keyboard",
            HelperAction::HideKeyboard => "hide_keyboard",
            HelperAction::TypeOnKeyboard { .. } => "type_on_keyboard",
            HelperAction::TypeInto { .. } => "type_into",
            HelperAction::GetValue { .. } => "get_value",
        }
    }
}

/// A journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: HelperAction,
    pub result: ActionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActionLog {
    /// Creates an entry with a fresh id, stamped with the current time.
    pub fn new(action: HelperAction, result: ActionResult, duration_ms: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            result,
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.result == ActionResult::Success
    }
}
