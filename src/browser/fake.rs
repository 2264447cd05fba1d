//! Scripted in-memory page used by unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::{json, Value};

use super::context::{NodeId, PageContext, PageScript, PdfExport};
use crate::{CaptureError, Result, Viewport};

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    pub node: NodeId,
    pub position: &'static str,
    pub z_index: &'static str,
}

impl FakeElement {
    pub fn new(node: NodeId, position: &'static str, z_index: &'static str) -> Self {
        Self {
            node,
            position,
            z_index,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub body: Option<(u32, u32)>,
    pub inner_height: u32,
    /// Height added each time a scroll reaches the bottom, consumed in order.
    pub growth: VecDeque<u32>,
    /// Scrolling to the bottom issues a request while the probe is installed.
    pub network_on_scroll: bool,
    pub probe_installed: bool,
    pub probe_triggered: bool,
    pub removal_suppressed: bool,
    pub scroll_y: u32,
    pub elements: Vec<FakeElement>,
    pub removed: Vec<NodeId>,
    pub stylesheets: Value,
    pub skipped_selectors: u32,
    pub viewports: Vec<Viewport>,
    pub navigated: Vec<String>,
    pub exported: Option<(PathBuf, PdfExport)>,
    pub calls: Vec<(&'static str, Value)>,
    pub fail_on: Option<&'static str>,
    pub binding: Option<mpsc::UnboundedSender<String>>,
}

pub(crate) struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(width: u32, height: u32, inner_height: u32) -> Self {
        Self {
            state: Mutex::new(FakeState {
                body: Some((width, height)),
                inner_height,
                stylesheets: json!([]),
                ..FakeState::default()
            }),
        }
    }

    pub fn with<F: FnOnce(&mut FakeState)>(self, configure: F) -> Self {
        configure(&mut self.state.lock().unwrap());
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(|(name, _)| *name).collect()
    }

    pub fn calls_named(&self, name: &str) -> Vec<Value> {
        self.state()
            .calls
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Delivers a payload to the exposed function, as the page would.
    pub fn emit(&self, payload: Value) {
        if let Some(sender) = &self.state().binding {
            let _ = sender.unbounded_send(payload.to_string());
        }
    }

    /// Closes the exposed function stream, as page teardown would.
    pub fn close_binding(&self) {
        self.state().binding = None;
    }

    fn scroll_reaching(state: &mut FakeState, y: u32) {
        state.scroll_y = y;
        let Some((width, height)) = state.body else {
            return;
        };
        if y + state.inner_height.max(1) > height || y >= height {
            if state.network_on_scroll && state.probe_installed {
                state.probe_triggered = true;
            }
            if let Some(extra) = state.growth.pop_front() {
                state.body = Some((width, height + extra));
            }
        }
    }
}

#[async_trait]
impl PageContext for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state().navigated.push(url.to_string());
        Ok(())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.state().viewports.push(viewport);
        Ok(())
    }

    async fn evaluate(&self, script: &PageScript) -> Result<Value> {
        let mut state = self.state();
        state.calls.push((script.name(), script.args().clone()));
        if state.fail_on == Some(script.name()) {
            return Err(CaptureError::script(script.name(), "simulated failure"));
        }
        let args = script.args();
        let value = match script.name() {
            "bootstrap" => json!(true),
            "geometry" => match state.body {
                Some((width, height)) => json!({ "width": width, "height": height }),
                None => Value::Null,
            },
            "scroll_to" => {
                let y = args["y"].as_u64().unwrap_or(0) as u32;
                Self::scroll_reaching(&mut state, y);
                Value::Null
            }
            "scroll_by" => {
                let y = state.scroll_y + args["dy"].as_u64().unwrap_or(0) as u32;
                Self::scroll_reaching(&mut state, y);
                Value::Null
            }
            "window_metrics" => json!({ "innerWidth": 1280, "innerHeight": state.inner_height }),
            "network_probe_install" => {
                state.probe_installed = true;
                state.probe_triggered = false;
                json!(true)
            }
            "network_probe_finish" => {
                state.probe_installed = false;
                json!(state.probe_triggered)
            }
            "removal_policy" => {
                state.removal_suppressed = args["suppress"].as_bool().unwrap_or(false);
                Value::Null
            }
            "observe_class_mutations" | "revert_class" => json!(true),
            "positioned_elements" => {
                let removed = state.removed.clone();
                Value::Array(
                    state
                        .elements
                        .iter()
                        .filter(|el| el.position != "static" && !removed.contains(&el.node))
                        .map(|el| {
                            json!({ "node": el.node, "position": el.position, "zIndex": el.z_index })
                        })
                        .collect(),
                )
            }
            "remove_nodes" => {
                let mut count = 0;
                for node in args["nodes"].as_array().cloned().unwrap_or_default() {
                    if let Some(node) = node.as_u64() {
                        state.removed.push(node);
                        count += 1;
                    }
                }
                json!(count)
            }
            "stylesheets" => state.stylesheets.clone(),
            "clear_breaks" => json!(args["rules"].as_array().map_or(0, Vec::len)),
            "freeze_animations" => {
                let rules = args["rules"].as_array().map_or(0, Vec::len) as u32;
                let skipped = state.skipped_selectors.min(rules);
                json!({ "frozen": rules - skipped, "skipped": skipped })
            }
            other => return Err(CaptureError::script(script.name(), format!("unknown script {other}"))),
        };
        Ok(value)
    }

    async fn expose_function(&self, _name: &str) -> Result<BoxStream<'static, String>> {
        let (sender, receiver) = mpsc::unbounded();
        self.state().binding = Some(sender);
        Ok(receiver.boxed())
    }

    async fn export_pdf(&self, path: &Path, export: PdfExport) -> Result<()> {
        self.state().exported = Some((path.to_path_buf(), export));
        Ok(())
    }
}
