//! Test-case session over an automation driver.
//!
//! A [`UiSession`] is what a UI test holds for its whole run:
//!
//! - it launches the app with an immutable [`LaunchConfig`](crate::config::LaunchConfig);
//! - it keeps a popup handler registered that accepts common permission prompts;
//! - it exposes every helper as a method, instrumented with a tracing span;
//! - it journals each helper call in a ring buffer (see [`history`](UiSession::history)).
//!
//! # Example
//!
//! ```no_run
//! use uihelpers_core::config::HelperConfig;
//! use uihelpers_core::driver::SharedDriver;
//! use uihelpers_core::element::{ElementRef, ElementType};
//! use uihelpers_core::error::HelperError;
//! use uihelpers_core::session::UiSession;
//!
//! async fn checkout(driver: SharedDriver) -> Result<(), HelperError> {
//!     let session = UiSession::new(driver, HelperConfig::default());
//!     session.tap_button("Checkout").await?;
//!     let email = ElementRef::identifier("email").of_type(ElementType::TextField);
//!     session.type_into(&email, "user@example.com").await?;
//!     session.hide_keyboard().await?;
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info_span, Instrument};

use crate::action::{ActionLog, ActionResult, HelperAction};
use crate::config::HelperConfig;
use crate::driver::{AutomationDriver, SharedDriver};
use crate::element::{ElementRef, ElementType, UIElement};
use crate::error::HelperError;
use crate::interruption::{self, AlertOutcome, InterruptionGuard};
use crate::scroll::{self, ScrollDirection, ScrollReport};
use crate::wait::{WaitConfig, Waiter};

/// Maximum number of journal entries to retain.
const MAX_ACTION_LOG_SIZE: usize = 1000;

/// Helpers bound to one driver for the length of a test case.
pub struct UiSession {
    driver: SharedDriver,
    config: HelperConfig,
    journal: Mutex<VecDeque<ActionLog>>,
    popup_guard: InterruptionGuard,
}

impl UiSession {
    /// Creates a session over an already launched driver and registers the
    /// default popup handler.
    pub fn new(driver: SharedDriver, config: HelperConfig) -> Self {
        let popup_guard = InterruptionGuard::register(
            driver.clone(),
            "handle popups",
            interruption::tap_first_of(config.popup_buttons.clone()),
        );
        Self {
            driver,
            config,
            journal: Mutex::new(VecDeque::new()),
            popup_guard,
        }
    }

    /// Launches the app with `config.launch`, then creates the session.
    pub async fn launch<D>(mut driver: D, config: HelperConfig) -> Result<Self, HelperError>
    where
        D: AutomationDriver + 'static,
    {
        driver.launch(&config.launch).await?;
        debug!(
            arguments = ?config.launch.launch_arguments(),
            "application launched"
        );
        Ok(Self::new(Arc::new(driver), config))
    }

    pub fn driver(&self) -> &SharedDriver {
        &self.driver
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Id of the session-wide popup handler.
    pub fn popup_handler(&self) -> interruption::HandlerId {
        self.popup_guard.id()
    }

    /// Journal entries, oldest first.
    pub async fn history(&self) -> Vec<ActionLog> {
        self.journal.lock().await.iter().cloned().collect()
    }

    fn waiter(&self) -> Waiter<'_> {
        Waiter::new(self.driver.as_ref()).with_interval(self.config.poll_interval())
    }

    fn default_wait(&self) -> WaitConfig {
        WaitConfig::new(self.config.wait_timeout())
    }

    async fn record(&self, action: HelperAction, result: ActionResult, duration_ms: u64) {
        let mut journal = self.journal.lock().await;
        if journal.len() >= MAX_ACTION_LOG_SIZE {
            journal.pop_front();
        }
        journal.push_back(ActionLog::new(action, result, Some(duration_ms)));
    }

    /// Runs one helper inside a span named after the action and journals it.
    async fn run<T, Fut>(&self, action: HelperAction, op: Fut) -> Result<T, HelperError>
    where
        Fut: Future<Output = Result<T, HelperError>>,
    {
        let span = info_span!("helper", action = action.name());
        async {
            let start = Instant::now();
            let result = op.await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            debug!(elapsed_ms, success = result.is_ok(), "helper complete");
            let entry = match &result {
                Ok(_) => ActionResult::Success,
                Err(e) => ActionResult::Failure(e.to_string()),
            };
            self.record(action, entry, elapsed_ms).await;
            result
        }
        .instrument(span)
        .await
    }

    // -- waiting ---------------------------------------------------------

    /// Waits for `target` to exist, using the configured default timeout.
    pub async fn wait_for(&self, target: &ElementRef) -> Result<(), HelperError> {
        self.wait_with(target, self.default_wait()).await
    }

    /// Waits for `target` with explicit timeout and hittability requirement.
    pub async fn wait_with(&self, target: &ElementRef, config: WaitConfig) -> Result<(), HelperError> {
        let action = HelperAction::WaitFor {
            target: target.to_string(),
            timeout_ms: config.timeout.as_millis() as u64,
            require_hittable: config.require_hittable,
        };
        self.run(action, self.waiter().wait(target, config)).await
    }

    /// Waits for `target` to disappear.
    pub async fn wait_for_absence(&self, target: &ElementRef, timeout: Duration) -> Result<(), HelperError> {
        let action = HelperAction::WaitForAbsence {
            target: target.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };
        self.run(action, self.waiter().wait_for_absence(target, timeout)).await
    }

    /// Checks for `target` for at most `timeout` without failing on a miss.
    pub async fn probe(&self, target: &ElementRef, timeout: Duration) -> Result<bool, HelperError> {
        Ok(self.waiter().probe(target, timeout, false).await?)
    }

    // -- scrolling -------------------------------------------------------

    /// Scrolls `container` in `direction` until `target` is hittable.
    pub async fn scroll_to_element(
        &self,
        container: &ElementRef,
        target: &ElementRef,
        direction: ScrollDirection,
    ) -> Result<ScrollReport, HelperError> {
        let action = HelperAction::ScrollTo {
            container: container.to_string(),
            target: target.to_string(),
        };
        let policy = self.config.scroll_policy(direction);
        self.run(
            action,
            scroll::scroll_to_element(self.driver.as_ref(), container, target, policy),
        )
        .await
    }

    // -- tapping ---------------------------------------------------------

    async fn wait_and_tap(&self, target: &ElementRef) -> Result<(), HelperError> {
        self.waiter().wait(target, self.default_wait()).await?;
        self.driver.tap(target).await?;
        Ok(())
    }

    async fn wait_and_tap_center(&self, target: &ElementRef) -> Result<(), HelperError> {
        self.waiter().wait(target, self.default_wait()).await?;
        let frame = self
            .driver
            .frame(target)
            .await?
            .ok_or_else(|| HelperError::ElementMissing {
                target: target.to_string(),
                operation: "tap its centre",
            })?;
        self.driver.tap_at(frame.center()).await?;
        Ok(())
    }

    /// Waits for `target`, then taps it.
    pub async fn tap_element(&self, target: &ElementRef) -> Result<(), HelperError> {
        let action = HelperAction::TapElement { target: target.to_string() };
        self.run(action, self.wait_and_tap(target)).await
    }

    /// Waits for `target`, then taps the centre of its frame.
    pub async fn tap_center(&self, target: &ElementRef) -> Result<(), HelperError> {
        let action = HelperAction::TapCenter { target: target.to_string() };
        self.run(action, self.wait_and_tap_center(target)).await
    }

    /// Taps the button with identifier or label `name`.
    pub async fn tap_button(&self, name: &str) -> Result<(), HelperError> {
        let target = ElementRef::named(name).of_type(ElementType::Button);
        let action = HelperAction::TapButton { name: name.to_string() };
        self.run(action, self.wait_and_tap(&target)).await
    }

    /// Taps the image with identifier or label `name`.
    pub async fn tap_image(&self, name: &str) -> Result<(), HelperError> {
        let target = ElementRef::named(name).of_type(ElementType::Image);
        let action = HelperAction::TapImage { name: name.to_string() };
        self.run(action, self.wait_and_tap(&target)).await
    }

    /// Resolves `identifier` through the configured lookup table.
    pub async fn find_identified(&self, identifier: &str) -> Result<(ElementType, UIElement), HelperError> {
        self.config.lookup.find(self.driver.as_ref(), identifier).await
    }

    /// Resolves `identifier` through the lookup table and taps the element found.
    pub async fn tap_identified(&self, identifier: &str) -> Result<ElementType, HelperError> {
        let action = HelperAction::TapIdentified { identifier: identifier.to_string() };
        self.run(action, async {
            let (category, _) = self.find_identified(identifier).await?;
            self.driver
                .tap(&ElementRef::identifier(identifier).of_type(category))
                .await?;
            Ok::<_, HelperError>(category)
        })
        .await
    }

    /// Taps the `index`-th cell, counted across all collection views on
    /// screen, optionally asserting that it ends up selected.
    pub async fn tap_collection_view_cell(&self, index: usize, assert_selected: bool) -> Result<(), HelperError> {
        let collection = ElementRef::any(ElementType::CollectionView);
        let cell = ElementRef::any(ElementType::Cell).nth(index).within(&collection);
        let action = HelperAction::TapCell { index, assert_selected };
        self.run(action, async {
            self.wait_and_tap(&cell).await?;
            if assert_selected && !self.driver.is_selected(&cell).await? {
                return Err(HelperError::Assertion {
                    target: cell.to_string(),
                    message: "expected cell to be selected after tap".to_string(),
                });
            }
            Ok::<_, HelperError>(())
        })
        .await
    }

    /// Taps the disclosure indicator (third button) of the `index`-th cell.
    pub async fn tap_disclosure_indicator_on_cell(&self, index: usize) -> Result<(), HelperError> {
        let cell = ElementRef::any(ElementType::Cell).nth(index);
        let indicator = ElementRef::any(ElementType::Button).nth(2).within(&cell);
        let action = HelperAction::TapDisclosureIndicator { index };
        self.run(action, self.wait_and_tap_center(&indicator)).await
    }

    /// Scrolls the collection view `collection` down until the cell with
    /// identifier `name` is hittable, then taps it.
    pub async fn select_collection_view_cell(&self, name: &str, collection: &str) -> Result<ScrollReport, HelperError> {
        let container = ElementRef::named(collection).of_type(ElementType::CollectionView);
        let cell = ElementRef::identifier(name).of_type(ElementType::Cell).within(&container);
        let policy = self.config.scroll_policy(self.config.default_scroll_direction());
        let action = HelperAction::SelectCell {
            name: name.to_string(),
            collection: collection.to_string(),
        };
        self.run(action, async {
            let report = scroll::scroll_to_element(self.driver.as_ref(), &container, &cell, policy).await?;
            self.driver.tap(&cell).await?;
            Ok::<_, HelperError>(report)
        })
        .await
    }

    /// Taps the submit button of a picker's toolbar.
    pub async fn picker_tap_submit_button(&self) -> Result<(), HelperError> {
        let submit = ElementRef::any(ElementType::Button).within(&ElementRef::any(ElementType::Toolbar));
        self.run(HelperAction::PickerSubmit, self.wait_and_tap(&submit)).await
    }

    /// Waits up to `timeout` for a system alert and taps its `name` button.
    ///
    /// Not finding the alert is reported through [`AlertOutcome::TimedOut`],
    /// not as an error.
    pub async fn tap_alert_button(&self, name: &str, timeout: Duration) -> Result<AlertOutcome, HelperError> {
        let action = HelperAction::TapAlertButton {
            name: name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        };
        let policy = self.config.alert_policy(timeout);
        self.run(action, async {
            let outcome = interruption::tap_until_alert_handled(&self.driver, name, policy).await?;
            Ok::<_, HelperError>(outcome)
        })
        .await
    }

    // -- keyboard and text -----------------------------------------------

    /// Waits for the software keyboard.
    ///
    /// If the keyboard never shows on a simulator, the hardware keyboard is
    /// probably connected.
    pub async fn show_keyboard(&self) -> Result<(), HelperError> {
        let keyboard = ElementRef::any(ElementType::Keyboard);
        self.run(HelperAction::ShowKeyboard, self.waiter().wait(&keyboard, self.default_wait()))
            .await
    }

    /// Dismisses the keyboard by typing a return.
    pub async fn hide_keyboard(&self) -> Result<(), HelperError> {
        self.run(HelperAction::HideKeyboard, async {
            self.driver.type_text(None, "\n").await?;
            Ok::<_, HelperError>(())
        })
        .await
    }

    /// Types `text` by tapping the on-screen key for each character.
    pub async fn type_on_keyboard(&self, text: &str) -> Result<(), HelperError> {
        let keyboard = ElementRef::any(ElementType::Keyboard);
        let action = HelperAction::TypeOnKeyboard { text: text.to_string() };
        self.run(action, async {
            for ch in text.chars() {
                let key = ElementRef::exact(ch.to_string())
                    .of_type(ElementType::Key)
                    .within(&keyboard);
                self.driver.tap(&key).await?;
            }
            Ok::<_, HelperError>(())
        })
        .await
    }

    /// Waits for `target`, taps it to focus, and types `text` into it.
    pub async fn type_into(&self, target: &ElementRef, text: &str) -> Result<(), HelperError> {
        let action = HelperAction::TypeInto {
            target: target.to_string(),
            text: text.to_string(),
        };
        self.run(action, async {
            self.wait_and_tap(target).await?;
            self.driver.type_text(Some(target), text).await?;
            Ok::<_, HelperError>(())
        })
        .await
    }

    /// Reads the text value of `target`.
    ///
    /// An element without a value is a [`HelperError::TypeMismatch`].
    pub async fn value_of(&self, target: &ElementRef) -> Result<String, HelperError> {
        let action = HelperAction::GetValue { target: target.to_string() };
        self.run(action, async {
            self.waiter().wait(target, self.default_wait()).await?;
            self.driver
                .current_value(target)
                .await?
                .ok_or_else(|| HelperError::TypeMismatch {
                    target: target.to_string(),
                    expected: "text",
                    found: "none".to_string(),
                })
        })
        .await
    }
}
