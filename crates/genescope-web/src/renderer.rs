//! Plot rendering collaborator.
//!
//! The plotting library itself is external; this module defines the seam the
//! controller talks to, a renderer that emits Plotly bootstrap snippets, and a
//! recording renderer for tests.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use genescope_common::error::{GenescopeError, Result};
use genescope_common::models::{ClickNotification, PlotClick, PlotOptions};

use crate::container::Container;

/// Asynchronous "render series into container" plus click subscription.
#[async_trait]
pub trait PlotRenderer: Send + Sync {
    /// Render `data` (an array of traces) with `layout` into `target`.
    async fn new_plot(
        &self,
        target: &dyn Container,
        data: &Value,
        layout: &Value,
        options: PlotOptions,
    ) -> Result<()>;

    /// Point-click notifications for every container this renderer drew.
    fn subscribe_clicks(&self) -> broadcast::Receiver<ClickNotification>;
}

/// Broadcast channel carrying point clicks to subscribers.
#[derive(Debug, Clone)]
pub struct ClickBus {
    tx: broadcast::Sender<ClickNotification>,
}

impl ClickBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish a click on `container`; returns the number of subscribers reached.
    pub fn emit(&self, container: &str, event: PlotClick) -> usize {
        self.tx
            .send(ClickNotification { container: container.to_string(), event })
            .unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClickNotification> {
        self.tx.subscribe()
    }
}

impl Default for ClickBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Plotly rejects anything but an array of trace objects.
fn validate_traces(data: &Value) -> Result<usize> {
    let traces = data
        .as_array()
        .ok_or_else(|| GenescopeError::Render(format!("expected an array of traces, got {}", kind(data))))?;
    if let Some(bad) = traces.iter().position(|t| !t.is_object()) {
        return Err(GenescopeError::Render(format!("trace {} is not an object", bad)));
    }
    Ok(traces.len())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON safe to inline inside a `<script>` element.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

// ── Plotly snippet renderer ─────────────────────────────────────────────────

/// Writes a `Plotly.newPlot` bootstrap script into the container, so a
/// snapshot of the container draws the plot once loaded in a browser.
#[derive(Debug, Default)]
pub struct PlotlySnippetRenderer {
    bus: ClickBus,
}

impl PlotlySnippetRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a point click reported by the page for `container`.
    pub fn click(&self, container: &str, event: PlotClick) -> usize {
        self.bus.emit(container, event)
    }
}

#[async_trait]
impl PlotRenderer for PlotlySnippetRenderer {
    async fn new_plot(
        &self,
        target: &dyn Container,
        data: &Value,
        layout: &Value,
        options: PlotOptions,
    ) -> Result<()> {
        let traces = validate_traces(data)?;
        let config = serde_json::to_string(&options)?;
        let html = format!(
            r#"<script data-traces="{}">Plotly.newPlot(document.currentScript.parentElement, {}, {}, {});</script>"#,
            traces,
            script_json(data)?,
            script_json(layout)?,
            config,
        );
        target.set_html(html);
        debug!(container = target.id(), traces, "Plot snippet written");
        Ok(())
    }

    fn subscribe_clicks(&self) -> broadcast::Receiver<ClickNotification> {
        self.bus.subscribe()
    }
}

// ── Recording renderer for tests ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub container: String,
    pub data: Value,
    pub layout: Value,
    pub options: PlotOptions,
}

/// Renderer that records every call and can be told to fail per container.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
    failing: HashSet<String>,
    bus: ClickBus,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every render into `container` fail.
    pub fn failing_on(mut self, container: &str) -> Self {
        self.failing.insert(container.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn calls_for(&self, container: &str) -> Vec<RenderCall> {
        self.calls().into_iter().filter(|c| c.container == container).collect()
    }

    /// Simulate a point click on `container`.
    pub fn click(&self, container: &str, event: PlotClick) -> usize {
        self.bus.emit(container, event)
    }
}

#[async_trait]
impl PlotRenderer for RecordingRenderer {
    async fn new_plot(
        &self,
        target: &dyn Container,
        data: &Value,
        layout: &Value,
        options: PlotOptions,
    ) -> Result<()> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(RenderCall {
            container: target.id().to_string(),
            data: data.clone(),
            layout: layout.clone(),
            options,
        });
        if self.failing.contains(target.id()) {
            return Err(GenescopeError::Render(format!("renderer refused container {}", target.id())));
        }
        let traces = validate_traces(data)?;
        target.set_html(format!(r#"<div class="plot" data-traces="{}"></div>"#, traces));
        Ok(())
    }

    fn subscribe_clicks(&self) -> broadcast::Receiver<ClickNotification> {
        self.bus.subscribe()
    }
}
