//! Failure Capture
//!
//! Wraps construction and collection failures into structured reports instead
//! of letting them unwind the traversal. Each report carries the failing
//! node's address, a human-readable summary and a rendered diagnostic trace.
//! Trace frames belonging to the engine's own machinery are flagged internal
//! and elided at render time so the output shows only frames relevant to the
//! failing artifact; extension failures are never elided.

use std::path::PathBuf;

use serde::Serialize;

use super::error::CollectError;

/// Namespace prefix marking engine-internal trace frames
pub const INTERNAL_FRAME_PREFIX: &str = "tcollect::collect";

/// One entry in a diagnostic trace
#[derive(Debug, Clone, Serialize)]
pub struct TraceFrame {
    /// Frame origin: `path:line` for artifact frames, an engine component
    /// path for internal frames
    pub location: String,

    /// Source excerpt for artifact frames, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub message: String,

    /// Internal frames belong to traversal/loading machinery and are pruned
    /// from the rendered trace
    pub internal: bool,
}

impl TraceFrame {
    pub(crate) fn internal(component: &str, message: impl Into<String>) -> Self {
        Self {
            location: format!("{}::{}", INTERNAL_FRAME_PREFIX, component),
            source: None,
            message: message.into(),
            internal: true,
        }
    }

    pub fn artifact(
        location: impl Into<String>,
        source: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self { location: location.into(), source, message: message.into(), internal: false }
    }
}

/// A captured discovery failure, keyed by node address
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub node_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Human-readable summary surfacing the original error text
    pub summary: String,

    /// Full trace, internal frames included
    pub trace: Vec<TraceFrame>,

    /// Pruned rendering, or a variant-specific override
    pub rendered: String,
}

impl FailureReport {
    /// Build a report from a collection error. When a node variant supplied
    /// its own rendering for this failure kind it replaces the default
    /// pruned-trace rendering.
    pub(crate) fn from_error(
        node_id: String,
        path: Option<PathBuf>,
        error: &CollectError,
        rendered_override: Option<String>,
    ) -> Self {
        let trace = build_trace(error);
        let rendered = rendered_override.unwrap_or_else(|| render_trace(&trace));
        Self { node_id, path, summary: error.to_string(), trace, rendered }
    }
}

/// Assemble the trace for an error, engine frames included
pub(crate) fn build_trace(error: &CollectError) -> Vec<TraceFrame> {
    let mut frames = vec![TraceFrame::internal("session", "wrapping collection step")];
    match error {
        CollectError::Load { path, line, message, source_line } => {
            frames.push(TraceFrame::internal("python", "scanning source artifact"));
            frames.push(TraceFrame::artifact(
                format!("{}:{}", path.display(), line),
                source_line.clone(),
                message.clone(),
            ));
        }
        CollectError::Io { path, message } => {
            frames.push(TraceFrame::internal("nodes", "reading filesystem entry"));
            frames.push(TraceFrame::artifact(path.display().to_string(), None, message.clone()));
        }
        CollectError::Hook { hook, path, message } => {
            // Extension frames are not engine machinery and survive pruning
            frames.push(TraceFrame::artifact(
                format!("hook '{}' resolving {}", hook, path.display()),
                None,
                message.clone(),
            ));
        }
        CollectError::Custom { kind, message } => {
            frames.push(TraceFrame::artifact(kind.clone(), None, message.clone()));
        }
        CollectError::InvalidRoot { path, message } => {
            frames.push(TraceFrame::artifact(path.display().to_string(), None, message.clone()));
        }
        CollectError::Configuration { message } => {
            frames.push(TraceFrame::artifact("configuration", None, message.clone()));
        }
        CollectError::SessionClosed => {
            frames.push(TraceFrame::internal("session", "session dropped during collection"));
        }
    }
    frames
}

/// Render a trace with internal frames elided. When every frame is internal
/// the innermost one survives so the rendering is never empty.
pub fn render_trace(frames: &[TraceFrame]) -> String {
    let relevant: Vec<&TraceFrame> = frames.iter().filter(|f| !f.internal).collect();
    let chosen: Vec<&TraceFrame> = if relevant.is_empty() {
        frames.last().into_iter().collect()
    } else {
        relevant
    };

    let mut out = String::new();
    for frame in chosen {
        if let Some(source) = &frame.source {
            out.push_str(source);
            out.push('\n');
        }
        out.push_str(&frame.location);
        out.push_str(": ");
        out.push_str(&frame.message);
        out.push('\n');
    }
    out
}
