//! Helper and launch configuration.
//!
//! [`HelperConfig`] holds the timing defaults the helpers use and the
//! [`LaunchConfig`] handed to the driver when a session starts. It can be
//! stored in `~/.uihelpers/config.json`; every field has a default, so a
//! partial file is fine.
//!
//! # Example
//!
//! ```no_run
//! use uihelpers_core::config::HelperConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = HelperConfig::load();
//! println!("waiting up to {:?}", config.wait_timeout());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::Point;
use crate::interruption::{default_popup_buttons, AlertTapPolicy};
use crate::lookup::LookupTable;
use crate::scroll::{ScrollDirection, ScrollPolicy, DEFAULT_SCROLL_MAGNITUDE};

const CONFIG_DIRNAME: &str = ".uihelpers";
const CONFIG_FILENAME: &str = "config.json";

/// Launch argument added when [`LaunchConfig::reset_state`] is set.
pub const RESET_ARGUMENT: &str = "--Reset";

/// Errors from reading or writing a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Home directory not available")]
    NoHomeDir,
}

/// Returns `~/.uihelpers/config.json`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIRNAME).join(CONFIG_FILENAME))
}

/// Options passed through to the driver when the application is launched.
///
/// Immutable once built; sessions take it by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Ask the app to wipe its persisted state on launch.
    pub reset_state: bool,
    /// Ask the app to turn off text autocorrection.
    pub disable_autocorrection: bool,
    /// Extra launch arguments, passed after the flag-derived ones.
    pub arguments: Vec<String>,
    /// Extra environment entries. These override flag-derived entries.
    pub environment: BTreeMap<String, String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            reset_state: true,
            disable_autocorrection: true,
            arguments: Vec::new(),
            environment: BTreeMap::new(),
        }
    }
}

impl LaunchConfig {
    #[must_use]
    pub fn with_reset_state(mut self, reset: bool) -> Self {
        self.reset_state = reset;
        self
    }

    #[must_use]
    pub fn with_autocorrection_disabled(mut self, disabled: bool) -> Self {
        self.disable_autocorrection = disabled;
        self
    }

    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// The full argument list for the process launch.
    pub fn launch_arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.arguments.len() + 1);
        if self.reset_state {
            args.push(RESET_ARGUMENT.to_string());
        }
        args.extend(self.arguments.iter().cloned());
        args
    }

    /// The full environment for the process launch.
    pub fn launch_environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if self.disable_autocorrection {
            env.insert("AutoCorrection".to_string(), "Disabled".to_string());
        }
        env.extend(self.environment.clone());
        env
    }
}

/// Timing defaults and launch options for a helper session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_magnitude: f64,
    pub scroll_probe_timeout_ms: u64,
    pub max_scroll_iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scroll_elapsed_ms: Option<u64>,
    pub alert_tap_interval_ms: u64,
    pub alert_tap_point: Point,
    /// Buttons the session-wide popup handler taps, in order.
    pub popup_buttons: Vec<String>,
    pub lookup: LookupTable,
    pub launch: LaunchConfig,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 15_000,
            poll_interval_ms: 100,
            scroll_magnitude: DEFAULT_SCROLL_MAGNITUDE,
            scroll_probe_timeout_ms: 1_000,
            max_scroll_iterations: 50,
            max_scroll_elapsed_ms: None,
            alert_tap_interval_ms: 1_000,
            alert_tap_point: Point::new(0.0, 60.0),
            popup_buttons: default_popup_buttons(),
            lookup: LookupTable::default(),
            launch: LaunchConfig::default(),
        }
    }
}

impl HelperConfig {
    /// Load config from `~/.uihelpers/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        default_config_path()
            .and_then(|path| Self::load_from(&path).ok())
            .unwrap_or_default()
    }

    /// Load config from `path`, reporting any error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save config to `~/.uihelpers/config.json`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = default_config_path().ok_or(ConfigError::NoHomeDir)?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Downward scroll by the configured magnitude.
    pub fn default_scroll_direction(&self) -> ScrollDirection {
        ScrollDirection::Down(self.scroll_magnitude)
    }

    /// Scroll budget for a search in `direction`.
    pub fn scroll_policy(&self, direction: ScrollDirection) -> ScrollPolicy {
        ScrollPolicy {
            direction,
            probe_timeout: Duration::from_millis(self.scroll_probe_timeout_ms),
            max_iterations: self.max_scroll_iterations,
            max_elapsed: self.max_scroll_elapsed_ms.map(Duration::from_millis),
        }
    }

    pub fn alert_policy(&self, timeout: Duration) -> AlertTapPolicy {
        AlertTapPolicy {
            timeout,
            interval: Duration::from_millis(self.alert_tap_interval_ms),
            tap_point: self.alert_tap_point,
        }
    }
}
