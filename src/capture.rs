//! Capture orchestration.
//!
//! [`capture`] runs every preparation pass against an already opened page in a
//! fixed order and exports the PDF; [`capture_url`] wraps it with browser
//! launch and shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::browser::{scripts, BrowserManager, BrowserOptions, PageContext, PdfExport};
use crate::prepare::{
    endless_scroll, geometry, layers, normalize, responsive, scroll_to, step_scroll,
    EndlessScrollCheck, FreezeReport, MutationGuard, PageGeometry, ScrollOutcome, ScrollTarget,
    StepReport,
};
use crate::resource::parse_page_url;
use crate::{Result, Viewport};

/// Operator-facing progress sink.
pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Default growth timeout for each scroll-to step.
pub const DEFAULT_SCROLL_TO_TIMEOUT: Duration = Duration::from_millis(4000);

/// Default pause before each step-scroll increment.
pub const DEFAULT_STEP_SCROLLING_PAUSE: Duration = Duration::from_millis(500);

/// Default wait for timer-driven page events before pruning.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// Scroll offset used to fire scroll handlers after the full-height resize.
const SCROLL_NUDGE: u32 = 100;

pub(crate) fn log_progress(progress: &Option<ProgressCallback>, message: &str) {
    if let Some(cb) = progress {
        cb(message);
    }
}

/// Which passes run and how.
#[derive(Clone)]
pub struct CaptureOptions {
    /// Requested viewport; its height is the PDF page height.
    pub viewport: Viewport,
    pub check_endless_scrolling: bool,
    /// Scroll until the content is at least this tall.
    pub scroll_to: Option<u32>,
    pub scroll_to_timeout: Duration,
    pub step_scrolling: bool,
    pub step_scrolling_pause: Duration,
    /// Fixed wait after scrolling; zero skips it.
    pub wait: Duration,
    pub remove_fixed: bool,
    /// Number of topmost positioned layers to remove.
    pub remove_layers: u32,
    /// Use the measured content height instead of the viewport height.
    pub full_page_height: bool,
    pub progress: Option<ProgressCallback>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            check_endless_scrolling: true,
            scroll_to: None,
            scroll_to_timeout: DEFAULT_SCROLL_TO_TIMEOUT,
            step_scrolling: false,
            step_scrolling_pause: DEFAULT_STEP_SCROLLING_PAUSE,
            wait: DEFAULT_WAIT,
            remove_fixed: false,
            remove_layers: 0,
            full_page_height: false,
            progress: None,
        }
    }
}

impl std::fmt::Debug for CaptureOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOptions")
            .field("viewport", &self.viewport)
            .field("check_endless_scrolling", &self.check_endless_scrolling)
            .field("scroll_to", &self.scroll_to)
            .field("scroll_to_timeout", &self.scroll_to_timeout)
            .field("step_scrolling", &self.step_scrolling)
            .field("step_scrolling_pause", &self.step_scrolling_pause)
            .field("wait", &self.wait)
            .field("remove_fixed", &self.remove_fixed)
            .field("remove_layers", &self.remove_layers)
            .field("full_page_height", &self.full_page_height)
            .finish_non_exhaustive()
    }
}

/// What each pass observed and did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    /// Geometry measured right after load.
    pub initial_geometry: PageGeometry,
    /// Geometry the export was based on.
    pub geometry: PageGeometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endless_scroll: Option<EndlessScrollCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_to: Option<ScrollOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_scroll: Option<StepReport>,
    pub removed_fixed: u32,
    pub removed_layers: u32,
    pub page_breaks_cleared: u32,
    pub animations: FreezeReport,
    pub breakpoint: u32,
    pub pdf_width: u32,
    pub pdf_height: u32,
}

/// Prepares the page at `url` and writes a single-page PDF to `out`.
///
/// Passes run strictly one after another. Any navigation or page failure
/// aborts the capture before a PDF is written.
pub async fn capture(
    page: Arc<dyn PageContext>,
    url: &str,
    out: &Path,
    options: &CaptureOptions,
) -> Result<CaptureReport> {
    let progress = &options.progress;
    let requested = options.viewport;

    log_progress(
        progress,
        &format!("Loading {url} at {}x{}", requested.width, requested.height),
    );
    page.set_viewport(requested).await?;
    page.navigate(url).await?;
    page.evaluate(&scripts::bootstrap()).await?;

    log_progress(progress, "Getting page dimensions");
    let initial_geometry = geometry::probe(page.as_ref()).await?;
    log_progress(
        progress,
        &format!("    {}x{}", initial_geometry.width, initial_geometry.height),
    );
    let mut measured = initial_geometry;

    let mut step_scrolling = options.step_scrolling;
    let mut endless_check = None;
    if options.check_endless_scrolling {
        log_progress(progress, "Checking scroll events");
        let check = endless_scroll::detect(page.as_ref()).await?;
        if check.detected() {
            log_progress(progress, "    Endless scrolling detected");
            step_scrolling = true;
            MutationGuard::install(page.clone()).await?;
        }
        endless_check = Some(check);
    }

    let mut scroll_outcome = None;
    if let Some(height) = options.scroll_to {
        let target = ScrollTarget {
            height,
            timeout: options.scroll_to_timeout,
        };
        scroll_outcome = Some(scroll_to::scroll_to(page.as_ref(), target, progress).await?);

        log_progress(progress, "Getting new dimensions");
        measured = geometry::probe(page.as_ref()).await?;
        log_progress(
            progress,
            &format!("    {}x{}", measured.width, measured.height),
        );
    }

    log_progress(progress, "Setting viewport to page height");
    page.set_viewport(requested.with_height(measured.height.max(1)))
        .await?;

    log_progress(progress, "Trigger viewport dependent scroll events");
    page.evaluate(&scripts::scroll_by(SCROLL_NUDGE)).await?;
    page.evaluate(&scripts::scroll_to(0)).await?;

    log_progress(progress, "Reverting viewport");
    page.set_viewport(requested).await?;

    let mut step_report = None;
    if step_scrolling {
        step_report = Some(
            step_scroll::step_scroll(page.as_ref(), options.step_scrolling_pause, progress)
                .await?,
        );
    }

    if !options.wait.is_zero() {
        log_progress(
            progress,
            &format!("Waiting {}ms", options.wait.as_millis()),
        );
        tokio::time::sleep(options.wait).await;
    }

    let mut removed_fixed = 0;
    if options.remove_fixed {
        log_progress(progress, "Remove fixed elements");
        removed_fixed = layers::remove_fixed_elements(page.as_ref()).await?;
        log_progress(progress, &format!("    Removed {removed_fixed}"));
    }

    let mut removed_layers = 0;
    if options.remove_layers > 0 {
        log_progress(
            progress,
            &format!(
                "Remove {} layers of positioned elements",
                options.remove_layers
            ),
        );
        removed_layers =
            layers::remove_layers(page.as_ref(), options.remove_layers as usize).await?;
        log_progress(progress, &format!("    Removed {removed_layers}"));
    }

    log_progress(progress, "Remove page breaks");
    let page_breaks_cleared = normalize::remove_page_breaks(page.as_ref()).await?;

    log_progress(progress, "Resetting animations");
    let animations = normalize::freeze_animations(page.as_ref()).await?;

    log_progress(progress, "Getting media query widths");
    let breakpoint = responsive::detect_breakpoint(page.as_ref()).await?;
    log_progress(progress, &format!("Media query width: {breakpoint}"));

    // Scrolling and pruning above may have resized the document.
    log_progress(progress, "Getting final dimensions");
    measured = geometry::probe(page.as_ref()).await?;
    log_progress(
        progress,
        &format!("    {}x{}", measured.width, measured.height),
    );

    let pdf_width = responsive::resolve_capture_width(breakpoint, requested.width, measured.width)
        .max(1);
    let pdf_height = if options.full_page_height {
        measured.height.max(1)
    } else {
        requested.height
    };

    log_progress(progress, "Setting final viewport size");
    page.set_viewport(Viewport::new(pdf_width, requested.height))
        .await?;

    log_progress(
        progress,
        &format!("Generating pdf ({pdf_width}x{pdf_height})"),
    );
    page.export_pdf(
        out,
        PdfExport {
            width: pdf_width,
            height: pdf_height,
        },
    )
    .await?;

    Ok(CaptureReport {
        initial_geometry,
        geometry: measured,
        endless_scroll: endless_check,
        scroll_to: scroll_outcome,
        step_scroll: step_report,
        removed_fixed,
        removed_layers,
        page_breaks_cleared,
        animations,
        breakpoint,
        pdf_width,
        pdf_height,
    })
}

/// Validates `url`, launches a browser, captures and closes the browser.
///
/// An invalid URL fails before anything is launched.
pub async fn capture_url(
    url: &str,
    out: &Path,
    options: &CaptureOptions,
    browser: BrowserOptions,
) -> Result<CaptureReport> {
    let url = parse_page_url(url)?;
    let progress = &options.progress;

    log_progress(
        progress,
        &format!(
            "Launching headless browser (nav {}s, idle {}s)…",
            browser.navigation_timeout.as_secs(),
            browser.network_idle_timeout.as_secs()
        ),
    );
    let manager = BrowserManager::launch(browser, options.viewport).await?;

    let result = match manager.new_page().await {
        Ok(page) => capture(Arc::new(page), url.as_str(), out, options).await,
        Err(err) => Err(err),
    };

    if let Err(err) = manager.close().await {
        log::warn!("failed to close browser cleanly: {err}");
    }
    result
}
