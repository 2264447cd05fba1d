use serde::{Deserialize, Serialize};

use crate::browser::{evaluate_as, scripts, PageContext};
use crate::{CaptureError, Result};

/// Content bounding box of the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub height: u32,
    pub width: u32,
}

/// Measures the body as `max(offset, scroll)` in both dimensions.
///
/// Never cached: each call reflects the DOM as it is now.
pub async fn probe(page: &dyn PageContext) -> Result<PageGeometry> {
    evaluate_as::<Option<PageGeometry>>(page, &scripts::geometry())
        .await?
        .ok_or(CaptureError::DocumentNotReady)
}
