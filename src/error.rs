use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::ResourceParseError;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid url '{value}': {message}")]
    InvalidUrl { value: String, message: String },

    #[error("Document not ready: page has no body element")]
    DocumentNotReady,

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page script '{script}' failed: {message}")]
    Script {
        script: &'static str,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn browser(message: impl Into<String>) -> Self {
        CaptureError::Browser(message.into())
    }

    pub fn script(script: &'static str, message: impl ToString) -> Self {
        CaptureError::Script {
            script,
            message: message.to_string(),
        }
    }

    pub fn navigation(url: impl Into<String>, message: impl ToString) -> Self {
        CaptureError::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            CaptureError::Io(e) => ErrorPayload::new(
                ErrorCategory::Io,
                e.to_string(),
                "Check the output path exists and is writable.",
            ),
            CaptureError::InvalidUrl { .. } => ErrorPayload::new(
                ErrorCategory::Input,
                self.to_string(),
                "Pass an absolute URL including the scheme (e.g., https://example.com).",
            ),
            CaptureError::DocumentNotReady => ErrorPayload::new(
                ErrorCategory::Page,
                self.to_string(),
                "The page did not produce a <body>; check that the URL serves an HTML document.",
            ),
            CaptureError::Browser(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("could not auto detect")
                    || lower.contains("executable")
                    || lower.contains("no such file")
                {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Install Chrome/Chromium or point --chrome-path (or [browser] chrome_path) at the executable.",
                    )
                } else if lower.contains("sandbox") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Chromium refused to start its sandbox; rerun with --no-sandbox inside containers.",
                    )
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "The browser stopped responding; retry or increase --nav-timeout.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Browser,
                        msg.to_string(),
                        "Re-run with --verbose for browser diagnostics.",
                    )
                }
            }
            CaptureError::Navigation { message, .. } => {
                if message.to_ascii_lowercase().contains("timeout")
                    || message.to_ascii_lowercase().contains("timed out")
                {
                    ErrorPayload::new(
                        ErrorCategory::Page,
                        self.to_string(),
                        "Try increasing --nav-timeout or ensure the page finishes loading.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Page,
                        self.to_string(),
                        "Verify the URL is reachable from this machine (DNS, proxy, VPN).",
                    )
                }
            }
            CaptureError::Script { .. } => ErrorPayload::new(
                ErrorCategory::Page,
                self.to_string(),
                "The page rejected an in-page step; re-run with --verbose and consider disabling the failing stage.",
            ),
            CaptureError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Page,
                e.to_string(),
                "The page returned an unexpected value; re-run with --verbose for details.",
            ),
            CaptureError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("toml") || lower.contains("failed to read config") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Fix the config file syntax or pass --config with a valid TOML file.",
                    )
                } else if lower.contains("timeout") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Timeouts must be positive durations (e.g., \"30s\", \"500ms\").",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags (e.g., --viewport-width/--viewport-height) and config values.",
                    )
                }
            }
        }
    }
}

impl From<ResourceParseError> for CaptureError {
    fn from(err: ResourceParseError) -> Self {
        match err {
            ResourceParseError::InvalidUrl { value, message } => {
                CaptureError::InvalidUrl { value, message }
            }
        }
    }
}

impl From<chromiumoxide::error::CdpError> for CaptureError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CaptureError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Input,
    Browser,
    Page,
    Config,
    Io,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
