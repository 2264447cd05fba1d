//! Endless-scroll detection.

use std::time::Duration;

use serde::Serialize;

use super::geometry;
use crate::browser::{evaluate_as, scripts, PageContext};
use crate::Result;

/// Time given to the page to react to the scroll before re-measuring.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(500);

/// Watches for script-issued HTTP requests (XHR and `fetch`) while installed.
///
/// Installing wraps the page's request entry points; [`finish`](Self::finish)
/// restores them and reports whether any request went out in between.
pub struct NetworkActivityProbe<'p> {
    page: &'p dyn PageContext,
}

impl<'p> NetworkActivityProbe<'p> {
    pub async fn install(page: &'p dyn PageContext) -> Result<NetworkActivityProbe<'p>> {
        let installed: bool = evaluate_as(page, &scripts::network_probe_install()).await?;
        if !installed {
            log::debug!("network probe was already installed; reusing it");
        }
        Ok(Self { page })
    }

    /// Uninstalls the probe and returns whether a request was issued.
    pub async fn finish(self) -> Result<bool> {
        evaluate_as(self.page, &scripts::network_probe_finish()).await
    }
}

/// Outcome of one detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndlessScrollCheck {
    pub height_before: u32,
    pub height_after: u32,
    pub network_triggered: bool,
}

impl EndlessScrollCheck {
    pub fn detected(&self) -> bool {
        self.height_after > self.height_before || self.network_triggered
    }
}

/// Scrolls to the bottom once and reports whether the page grew or fetched.
pub async fn detect(page: &dyn PageContext) -> Result<EndlessScrollCheck> {
    let height_before = geometry::probe(page).await?.height;

    let probe = NetworkActivityProbe::install(page).await?;
    page.evaluate(&scripts::scroll_to(height_before)).await?;
    tokio::time::sleep(SETTLE_INTERVAL).await;

    let height_after = geometry::probe(page).await?.height;
    let network_triggered = probe.finish().await?;

    let check = EndlessScrollCheck {
        height_before,
        height_after,
        network_triggered,
    };
    log::debug!("endless scroll check: {check:?}");
    Ok(check)
}
