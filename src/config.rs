use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::browser::{BrowserOptions, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_NETWORK_IDLE_TIMEOUT};
use crate::capture::{
    CaptureOptions, DEFAULT_SCROLL_TO_TIMEOUT, DEFAULT_STEP_SCROLLING_PAUSE, DEFAULT_WAIT,
};
use crate::Viewport;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Read(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// File-backed defaults for a capture. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub check_endless_scrolling: bool,
    #[serde(with = "humantime_serde")]
    pub scroll_to_timeout: Duration,
    pub step_scrolling: bool,
    #[serde(with = "humantime_serde")]
    pub step_scrolling_pause: Duration,
    #[serde(with = "humantime_serde")]
    pub wait: Duration,
    pub remove_fixed: bool,
    pub remove_layers: u32,
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    #[serde(with = "humantime_serde")]
    pub navigation_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub network_idle_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            no_sandbox: false,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            network_idle_timeout: DEFAULT_NETWORK_IDLE_TIMEOUT,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            check_endless_scrolling: true,
            scroll_to_timeout: DEFAULT_SCROLL_TO_TIMEOUT,
            step_scrolling: false,
            step_scrolling_pause: DEFAULT_STEP_SCROLLING_PAUSE,
            wait: DEFAULT_WAIT,
            remove_fixed: false,
            remove_layers: 0,
            browser: BrowserSettings::default(),
        }
    }
}

impl Config {
    /// `~/.config/pagetopdf/config.toml`, when a home directory is known.
    pub fn central_config_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME").filter(|h| !h.is_empty())?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("pagetopdf")
                .join("config.toml"),
        )
    }

    /// Loads `path`, else the central config if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::central_config_path() {
                Some(central) if central.is_file() => Self::from_file(&central),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport = self.viewport();
        if viewport.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "viewport must be non-zero, got {viewport}"
            )));
        }
        for (name, value) in [
            ("scroll_to_timeout", self.scroll_to_timeout),
            ("browser.navigation_timeout", self.browser.navigation_timeout),
            ("browser.network_idle_timeout", self.browser.network_idle_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    /// Capture options with every pass configured from this file. CLI
    /// overrides are applied on top by the binary.
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            viewport: self.viewport(),
            check_endless_scrolling: self.check_endless_scrolling,
            scroll_to: None,
            scroll_to_timeout: self.scroll_to_timeout,
            step_scrolling: self.step_scrolling,
            step_scrolling_pause: self.step_scrolling_pause,
            wait: self.wait,
            remove_fixed: self.remove_fixed,
            remove_layers: self.remove_layers,
            full_page_height: false,
            progress: None,
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            chrome_path: self.browser.chrome_path.clone(),
            headless: self.browser.headless,
            no_sandbox: self.browser.no_sandbox,
            navigation_timeout: self.browser.navigation_timeout,
            network_idle_timeout: self.browser.network_idle_timeout,
        }
    }
}
