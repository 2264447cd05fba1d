use serde::Serialize;
use std::path::PathBuf;

use crate::capture::CaptureReport;
use crate::error::ErrorPayload;
use crate::viewport::Viewport;

/// Schema version for output payloads.
pub const PAGETOPDF_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CaptureResult {
    Capture(CaptureOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutput {
    pub version: String,
    pub url: String,
    pub output_path: PathBuf,
    pub viewport: Viewport,
    #[serde(flatten)]
    pub report: CaptureReport,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::prepare::{FreezeReport, PageGeometry};

    fn report() -> CaptureReport {
        let geometry = PageGeometry {
            height: 4200,
            width: 1280,
        };
        CaptureReport {
            initial_geometry: geometry,
            geometry,
            endless_scroll: None,
            scroll_to: None,
            step_scroll: None,
            removed_fixed: 1,
            removed_layers: 0,
            page_breaks_cleared: 3,
            animations: FreezeReport::default(),
            breakpoint: 1200,
            pdf_width: 1280,
            pdf_height: 1080,
        }
    }

    #[test]
    fn capture_output_serializes_flat_report() {
        let output = CaptureResult::Capture(CaptureOutput {
            version: PAGETOPDF_OUTPUT_VERSION.to_string(),
            url: "https://example.com/".to_string(),
            output_path: PathBuf::from("out.pdf"),
            viewport: Viewport::new(1280, 1080),
            report: report(),
            elapsed_ms: 5120,
        });

        let json = serde_json::to_string(&output).expect("serialize capture output");
        assert!(json.contains("\"mode\":\"capture\""));
        assert!(json.contains("\"outputPath\":\"out.pdf\""));
        assert!(json.contains("\"pdfWidth\":1280"));
        assert!(json.contains("\"pageBreaksCleared\":3"));
        assert!(!json.contains("endlessScroll"));
    }

    #[test]
    fn error_output_serializes() {
        let output = CaptureResult::Error(ErrorOutput {
            version: PAGETOPDF_OUTPUT_VERSION.to_string(),
            message: Some("bad input".to_string()),
            error: ErrorPayload {
                category: ErrorCategory::Input,
                message: "bad input".to_string(),
                remediation: None,
            },
        });

        let json = serde_json::to_string(&output).expect("serialize error output");
        assert!(json.contains("\"mode\":\"error\""));
        assert!(json.contains("\"category\":\"input\""));
    }
}
