//! Layer pruning: fixed overlays and the topmost z-index layers.

use serde::Deserialize;

use crate::browser::{evaluate_as, scripts, NodeId, PageContext};
use crate::Result;

/// A non-static element as reported by the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedElement {
    pub node: NodeId,
    pub position: String,
    /// Computed `z-index`; `"auto"` when unset.
    pub z_index: String,
}

impl PositionedElement {
    pub fn is_fixed(&self) -> bool {
        self.position == "fixed"
    }

    /// Numeric z-index, `None` for `auto`.
    pub fn z_index(&self) -> Option<i32> {
        self.z_index.trim().parse().ok()
    }
}

/// Collects every element whose computed position is not `static`, in
/// document order.
pub async fn positioned_elements(page: &dyn PageContext) -> Result<Vec<PositionedElement>> {
    evaluate_as(page, &scripts::positioned_elements()).await
}

/// Elements positioned exactly `fixed`.
pub fn fixed_elements(elements: &[PositionedElement]) -> Vec<NodeId> {
    elements
        .iter()
        .filter(|el| el.is_fixed())
        .map(|el| el.node)
        .collect()
}

/// The `count` elements with the highest numeric z-index, highest first.
///
/// Elements are sorted ascending with a stable sort and taken from the top,
/// so among equal z-indices the later one in document order goes first.
pub fn topmost_layers(elements: &[PositionedElement], count: usize) -> Vec<NodeId> {
    let mut layered: Vec<(NodeId, i32)> = elements
        .iter()
        .filter_map(|el| el.z_index().map(|z| (el.node, z)))
        .collect();
    layered.sort_by_key(|&(_, z)| z);
    layered
        .into_iter()
        .rev()
        .take(count)
        .map(|(node, _)| node)
        .collect()
}

async fn remove(page: &dyn PageContext, nodes: &[NodeId]) -> Result<u32> {
    if nodes.is_empty() {
        return Ok(0);
    }
    evaluate_as(page, &scripts::remove_nodes(nodes)).await
}

/// Removes every fixed-position element. Returns the number removed.
pub async fn remove_fixed_elements(page: &dyn PageContext) -> Result<u32> {
    let elements = positioned_elements(page).await?;
    remove(page, &fixed_elements(&elements)).await
}

/// Removes up to `count` positioned elements, highest z-index first.
pub async fn remove_layers(page: &dyn PageContext, count: usize) -> Result<u32> {
    if count == 0 {
        return Ok(0);
    }
    let elements = positioned_elements(page).await?;
    let targets = topmost_layers(&elements, count);
    log::debug!(
        "removing {} of {} requested layer(s) from {} positioned element(s)",
        targets.len(),
        count,
        elements.len()
    );
    remove(page, &targets).await
}
