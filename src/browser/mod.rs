//! Browser automation for page preparation and PDF export.
//!
//! # Module Structure
//!
//! - [`context`] - the [`PageContext`] engine boundary and in-page script type
//! - [`scripts`] - the in-page scripts the preparation passes evaluate
//! - [`manager`] - Chromium launch and the CDP-backed [`ChromiumPage`]
//!
//! # Example
//!
//! ```no_run
//! use pagetopdf_lib::{BrowserManager, BrowserOptions, PageContext, Viewport};
//!
//! # async fn example() -> pagetopdf_lib::Result<()> {
//! let manager = BrowserManager::launch(BrowserOptions::default(), Viewport::default()).await?;
//! let page = manager.new_page().await?;
//! page.navigate("https://example.com").await?;
//! manager.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
mod manager;
pub mod scripts;

#[cfg(test)]
pub(crate) mod fake;

pub use context::{evaluate_as, NodeId, PageContext, PageScript, PdfExport};
pub use manager::{
    BrowserManager, BrowserOptions, ChromiumPage, DEFAULT_NAVIGATION_TIMEOUT,
    DEFAULT_NETWORK_IDLE_TIMEOUT,
};
