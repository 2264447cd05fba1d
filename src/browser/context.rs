//! The browser engine boundary.
//!
//! Every pipeline stage talks to the page through [`PageContext`]: navigation,
//! viewport control, script evaluation with JSON arguments and results, an
//! exposed function stream for callbacks out of the page, and PDF export.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{CaptureError, Result, Viewport};

/// Stable identity the page assigns to an element it has reported to the host.
pub type NodeId = u64;

/// A named in-page script.
///
/// `body` is the body of an `async (args) => { ... }` function; `args` is
/// serialised into the call so the page only ever sees JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct PageScript {
    name: &'static str,
    body: &'static str,
    args: Value,
}

impl PageScript {
    pub fn new(name: &'static str, body: &'static str) -> Self {
        Self {
            name,
            body,
            args: Value::Null,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn args(&self) -> &Value {
        &self.args
    }

    /// Renders the script as a self-invoking expression.
    pub fn to_expression(&self) -> String {
        format!("(async (args) => {{\n{}\n}})({})", self.body, self.args)
    }
}

/// Page export request handed to the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfExport {
    /// Paper width in CSS pixels.
    pub width: u32,
    /// Paper height in CSS pixels.
    pub height: u32,
}

#[async_trait]
pub trait PageContext: Send + Sync {
    /// Loads `url` and resolves once the network has settled.
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Evaluates `script` in the page and returns its JSON result.
    async fn evaluate(&self, script: &PageScript) -> Result<Value>;

    /// Installs `window[name](payload)` in the page; every call arrives on the
    /// returned stream.
    async fn expose_function(&self, name: &str) -> Result<BoxStream<'static, String>>;

    /// Writes a single-page PDF with background graphics and screen media.
    async fn export_pdf(&self, path: &Path, export: PdfExport) -> Result<()>;
}

/// Evaluates `script` and deserialises its result.
pub async fn evaluate_as<T: DeserializeOwned>(
    page: &dyn PageContext,
    script: &PageScript,
) -> Result<T> {
    let value = page.evaluate(script).await?;
    serde_json::from_value(value).map_err(|e| CaptureError::script(script.name(), e))
}
