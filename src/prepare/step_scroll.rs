//! Viewport-sized step scrolling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::geometry;
use crate::browser::{evaluate_as, scripts, PageContext};
use crate::capture::{log_progress, ProgressCallback};
use crate::Result;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowMetrics {
    inner_height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub steps: u32,
    pub step_height: u32,
    /// Content height measured after returning to the top.
    pub height: u32,
}

/// Number of viewport-sized increments needed to cover `total` pixels.
pub fn step_count(total: u32, viewport: u32) -> u32 {
    if viewport == 0 {
        return 0;
    }
    total.div_ceil(viewport)
}

/// Walks the page top to bottom one viewport at a time, pausing before each
/// increment, then returns to the top.
pub async fn step_scroll(
    page: &dyn PageContext,
    pause: Duration,
    progress: &Option<ProgressCallback>,
) -> Result<StepReport> {
    log_progress(progress, "Step-Scrolling");

    let total = geometry::probe(page).await?.height;
    let metrics: WindowMetrics = evaluate_as(page, &scripts::window_metrics()).await?;
    let steps = step_count(total, metrics.inner_height);

    page.evaluate(&scripts::scroll_to(0)).await?;
    for step in 1..=steps {
        tokio::time::sleep(pause).await;
        log_progress(progress, &format!("    Step {step} of {steps}"));
        page.evaluate(&scripts::scroll_by(metrics.inner_height)).await?;
    }
    page.evaluate(&scripts::scroll_to(0)).await?;

    let height = geometry::probe(page).await?.height;
    Ok(StepReport {
        steps,
        step_height: metrics.inner_height,
        height,
    })
}
