//! Chromium session management.
//!
//! [`BrowserManager`] launches a headless Chromium over the DevTools protocol and
//! hands out [`ChromiumPage`]s, the production [`PageContext`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, PrintToPdfParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    AddBindingParams, EvaluateParams, EventBindingCalled,
};
use chromiumoxide::page::Page;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::context::{PageContext, PageScript, PdfExport};
use crate::{CaptureError, Result, Viewport};

/// Default timeout for page navigation.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for waiting for network idle state.
pub const DEFAULT_NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// CSS pixels per inch used by the print pipeline.
const CSS_PIXELS_PER_INCH: f64 = 96.0;

/// Configuration options for browser sessions.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Chrome/Chromium executable; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Disable the Chromium sandbox (needed in most containers).
    pub no_sandbox: bool,
    /// Timeout for page navigation.
    pub navigation_timeout: Duration,
    /// Timeout for waiting for network idle state.
    pub network_idle_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            no_sandbox: false,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            network_idle_timeout: DEFAULT_NETWORK_IDLE_TIMEOUT,
        }
    }
}

/// A running Chromium process with its CDP event loop.
pub struct BrowserManager {
    options: BrowserOptions,
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserManager {
    /// Launches Chromium with the given options.
    pub async fn launch(options: BrowserOptions, viewport: Viewport) -> Result<Self> {
        let mut builder = BrowserConfig::builder().window_size(viewport.width, viewport.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(CaptureError::Browser)?;

        log::debug!("launching chromium (headless: {})", options.headless);
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::browser(format!("Failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    log::debug!("browser event error: {err:?}");
                }
            }
        });

        Ok(Self {
            options,
            browser,
            handler,
        })
    }

    /// Opens a blank tab.
    pub async fn new_page(&self) -> Result<ChromiumPage> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromiumPage {
            page,
            navigation_timeout: self.options.navigation_timeout,
            network_idle_timeout: self.options.network_idle_timeout,
        })
    }

    /// Closes the browser and stops the event loop.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed.map(|_| ()).map_err(CaptureError::from)
    }
}

/// A Chromium tab driven over CDP.
#[derive(Clone)]
pub struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
    network_idle_timeout: Duration,
}

/// Lifecycle fields the network-idle wait looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LifecycleSignal {
    frame: String,
    loader: String,
    name: String,
}

impl From<&EventLifecycleEvent> for LifecycleSignal {
    fn from(event: &EventLifecycleEvent) -> Self {
        Self {
            frame: event.frame_id.inner().clone(),
            loader: event.loader_id.inner().clone(),
            name: event.name.clone(),
        }
    }
}

impl ChromiumPage {
    /// Waits for the main frame's `networkIdle` belonging to the document
    /// its latest `init` started. Events from other frames are ignored; with
    /// no known main frame the first frame to start a document is followed.
    /// Returns `false` if the stream closes first.
    async fn wait_for_network_idle<S>(lifecycle: S, main_frame: Option<String>) -> bool
    where
        S: Stream<Item = LifecycleSignal>,
    {
        futures::pin_mut!(lifecycle);
        let mut main_frame = main_frame;
        let mut document: Option<String> = None;
        while let Some(signal) = lifecycle.next().await {
            if main_frame.as_ref().is_some_and(|frame| *frame != signal.frame) {
                continue;
            }
            match signal.name.as_str() {
                "init" => {
                    main_frame.get_or_insert_with(|| signal.frame.clone());
                    document = Some(signal.loader);
                }
                "networkIdle" if document.as_deref() == Some(signal.loader.as_str()) => {
                    return true
                }
                _ => {}
            }
        }
        false
    }
}

#[async_trait]
impl PageContext for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await?;
        let lifecycle = self.page.event_listener::<EventLifecycleEvent>().await?;

        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(CaptureError::navigation(url, err)),
            Err(_) => {
                return Err(CaptureError::navigation(
                    url,
                    format!("timed out after {:?}", self.navigation_timeout),
                ))
            }
        }

        let main_frame = self
            .page
            .mainframe()
            .await?
            .map(|frame| frame.inner().clone());
        if main_frame.is_none() {
            log::debug!("main frame unknown for {url}; following the first document");
        }
        let signals = lifecycle.map(|event| LifecycleSignal::from(event.as_ref()));

        match timeout(
            self.network_idle_timeout,
            Self::wait_for_network_idle(signals, main_frame),
        )
        .await
        {
            Ok(true) => log::debug!("network settled for {url}"),
            Ok(false) => log::warn!("lifecycle stream ended before network settled for {url}"),
            Err(_) => log::warn!(
                "network did not settle within {:?}; continuing with {url}",
                self.network_idle_timeout
            ),
        }
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width as i64)
            .height(viewport.height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| CaptureError::browser(format!("Failed to build viewport params: {e}")))?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &PageScript) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(script.to_expression())
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|e| CaptureError::script(script.name(), e))?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| CaptureError::script(script.name(), e))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn expose_function(&self, name: &str) -> Result<BoxStream<'static, String>> {
        let calls = self.page.event_listener::<EventBindingCalled>().await?;
        self.page.execute(AddBindingParams::new(name)).await?;

        let name = name.to_string();
        Ok(calls
            .filter_map(move |event| {
                let payload = (event.name == name).then(|| event.payload.clone());
                futures::future::ready(payload)
            })
            .boxed())
    }

    async fn export_pdf(&self, path: &Path, export: PdfExport) -> Result<()> {
        self.page
            .execute(SetEmulatedMediaParams::builder().media("screen").build())
            .await?;

        let params = PrintToPdfParams::builder()
            .print_background(true)
            .paper_width(export.width as f64 / CSS_PIXELS_PER_INCH)
            .paper_height(export.height as f64 / CSS_PIXELS_PER_INCH)
            .margin_top(0.0)
            .margin_bottom(0.0)
            .margin_left(0.0)
            .margin_right(0.0)
            .page_ranges("1")
            .build();
        let bytes = self.page.pdf(params).await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn signal(frame: &str, loader: &str, name: &str) -> LifecycleSignal {
        LifecycleSignal {
            frame: frame.to_string(),
            loader: loader.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn network_idle_from_iframe_does_not_settle_main_frame() {
        let events = vec![
            signal("main", "doc-1", "init"),
            signal("ad", "ad-1", "init"),
            signal("ad", "ad-1", "networkIdle"),
        ];
        let settled =
            ChromiumPage::wait_for_network_idle(stream::iter(events), Some("main".into())).await;
        assert!(!settled);
    }

    #[tokio::test]
    async fn main_frame_network_idle_settles() {
        let events = vec![
            signal("main", "doc-1", "init"),
            signal("ad", "ad-1", "networkIdle"),
            signal("main", "doc-1", "DOMContentLoaded"),
            signal("main", "doc-1", "networkIdle"),
        ];
        let settled =
            ChromiumPage::wait_for_network_idle(stream::iter(events), Some("main".into())).await;
        assert!(settled);
    }

    #[tokio::test]
    async fn idle_of_a_replaced_document_is_ignored() {
        let events = vec![
            signal("main", "doc-1", "init"),
            signal("main", "doc-2", "init"),
            signal("main", "doc-1", "networkIdle"),
        ];
        let settled =
            ChromiumPage::wait_for_network_idle(stream::iter(events), Some("main".into())).await;
        assert!(!settled);
    }

    #[tokio::test]
    async fn unknown_main_frame_follows_first_document() {
        let events = vec![
            signal("main", "doc-1", "init"),
            signal("ad", "ad-1", "init"),
            signal("ad", "ad-1", "networkIdle"),
            signal("main", "doc-1", "networkIdle"),
        ];
        let settled = ChromiumPage::wait_for_network_idle(stream::iter(events), None).await;
        assert!(settled);
    }

    #[test]
    fn browser_options_default_values() {
        let opts = BrowserOptions::default();
        assert!(opts.headless);
        assert!(!opts.no_sandbox);
        assert!(opts.chrome_path.is_none());
        assert_eq!(opts.navigation_timeout, DEFAULT_NAVIGATION_TIMEOUT);
        assert_eq!(opts.network_idle_timeout, DEFAULT_NETWORK_IDLE_TIMEOUT);
    }

    #[tokio::test]
    async fn launch_fails_for_missing_executable() {
        let result = BrowserManager::launch(
            BrowserOptions {
                chrome_path: Some(PathBuf::from("/definitely/not/a/chrome")),
                ..BrowserOptions::default()
            },
            Viewport::default(),
        )
        .await;

        assert!(matches!(result, Err(CaptureError::Browser(_))));
    }
}
