//! pagetopdf Library
//!
//! Prepares an arbitrary web page so that a single-page PDF export reflects
//! what a visitor actually sees: endless scrolling is detected and tamed,
//! lazy content is scrolled into existence, overlays and sticky layers can be
//! removed, and the capture width follows the page's own breakpoints.
//!
//! # Module Overview
//!
//! - [`browser`] - Chromium session and the [`PageContext`] engine boundary
//! - [`prepare`] - The individual page-preparation passes
//! - [`capture`] - Pass orchestration and PDF export
//! - [`config`] - Configuration file support
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pagetopdf_lib::{capture_url, BrowserOptions, CaptureOptions};
//!
//! # async fn example() -> pagetopdf_lib::Result<()> {
//! let options = CaptureOptions {
//!     remove_fixed: true,
//!     ..CaptureOptions::default()
//! };
//! let report = capture_url(
//!     "https://example.com",
//!     Path::new("example.pdf"),
//!     &options,
//!     BrowserOptions::default(),
//! )
//! .await?;
//! println!("{}x{}", report.pdf_width, report.pdf_height);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod prepare;
pub mod resource;
pub mod viewport;

// Browser module re-exports
pub use browser::{
    evaluate_as, BrowserManager, BrowserOptions, ChromiumPage, NodeId, PageContext, PageScript,
    PdfExport, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_NETWORK_IDLE_TIMEOUT,
};
pub use capture::{capture, capture_url, CaptureOptions, CaptureReport, ProgressCallback};
pub use config::{Config, ConfigError};
pub use error::{CaptureError, ErrorCategory, ErrorPayload, Result};
pub use output::{CaptureOutput, CaptureResult, ErrorOutput, PAGETOPDF_OUTPUT_VERSION};
pub use resource::{parse_page_url, ResourceParseError};
pub use viewport::Viewport;
