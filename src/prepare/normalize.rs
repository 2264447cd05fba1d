//! Style normalisation: page breaks and animations.

use serde::{Deserialize, Serialize};

use super::stylesheet::{self, RuleId, StyleSheetSet};
use crate::browser::{evaluate_as, scripts, PageContext};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreezeReport {
    /// Elements whose animation was paused.
    pub frozen: u32,
    /// Rules whose selector the page could not resolve.
    pub skipped: u32,
}

/// Clears `break-*` and `page-break-*` declarations from every style rule
/// that has any. Returns the number of rules touched.
pub async fn remove_page_breaks(page: &dyn PageContext) -> Result<u32> {
    let sheets = stylesheet::snapshot(page).await?;
    let mut rules: Vec<RuleId> = Vec::new();
    StyleSheetSet::flatten(&sheets).for_each_style_rule(|rule| {
        if rule.declares_breaks {
            rules.push(rule.id);
        }
    });
    if rules.is_empty() {
        return Ok(0);
    }
    evaluate_as(page, &scripts::clear_breaks(&rules)).await
}

/// Pauses every element matched by an animated rule at zero iterations.
pub async fn freeze_animations(page: &dyn PageContext) -> Result<FreezeReport> {
    let sheets = stylesheet::snapshot(page).await?;
    let mut rules: Vec<RuleId> = Vec::new();
    StyleSheetSet::flatten(&sheets).for_each_style_rule(|rule| {
        if rule.is_animated() {
            rules.push(rule.id);
        }
    });
    if rules.is_empty() {
        return Ok(FreezeReport::default());
    }

    let report: FreezeReport = evaluate_as(page, &scripts::freeze_animations(&rules)).await?;
    if report.skipped > 0 {
        log::debug!(
            "skipped {} animated rule(s) with unresolvable selectors",
            report.skipped
        );
    }
    Ok(report)
}
