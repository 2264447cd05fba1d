//! Responsive width resolution from `max-width` media queries.

use std::sync::LazyLock;

use regex::Regex;

use super::stylesheet::{self, StyleSheetSet};
use crate::browser::PageContext;
use crate::Result;

/// Margin added to a breakpoint so the capture width sits clearly above it.
pub const BREAKPOINT_MARGIN: u32 = 10;

static MAX_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"max-width.*?([0-9]+)").expect("BUG: invalid MAX_WIDTH_RE regex literal")
});

/// A condition counts when it bounds only the maximum width, in pixels.
pub fn qualifies(condition: &str) -> bool {
    condition.contains("max-width") && !condition.contains("min-width") && condition.contains("px")
}

/// The largest pixel breakpoint among qualifying conditions, `0` if none.
pub fn media_breakpoint<'a, I>(conditions: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    conditions
        .into_iter()
        .filter(|c| qualifies(c))
        .filter_map(|c| MAX_WIDTH_RE.captures(c))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// Picks the capture width: just above the breakpoint when it is at least
/// the requested width, otherwise `fallback`.
pub fn resolve_capture_width(breakpoint: u32, requested: u32, fallback: u32) -> u32 {
    if breakpoint != 0 && breakpoint >= requested {
        breakpoint.saturating_add(BREAKPOINT_MARGIN)
    } else {
        fallback
    }
}

/// Scans every media group, nested ones included, for the widest breakpoint.
pub async fn detect_breakpoint(page: &dyn PageContext) -> Result<u32> {
    let sheets = stylesheet::snapshot(page).await?;
    let mut conditions: Vec<&str> = Vec::new();
    StyleSheetSet::flatten(&sheets).for_each_group_rule(|group| {
        if let Some(media) = &group.media {
            conditions.extend(media.iter().map(String::as_str));
        }
    });
    let breakpoint = media_breakpoint(conditions);
    log::debug!("media query breakpoint: {breakpoint}");
    Ok(breakpoint)
}
