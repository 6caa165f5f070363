//! Where script output and non-fatal failures go.
//!
//! The host never prints. Everything a script logs, every style warning, and
//! every failed load or callback becomes a [`Diagnostic`] handed to the sink
//! injected at construction.

use parking_lot::Mutex;

use crate::css::parser::StyleParseWarning;
use crate::dom::WidgetId;
use crate::error::{CallbackError, LoadError};
use crate::logging::targets;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Output of the `log` global.
    ScriptLog { message: String },
    /// A problem in a style block attached to `widget`.
    StyleWarning { widget: Option<WidgetId>, warning: StyleParseWarning },
    LoadFailed(LoadError),
    CallbackFailed(CallbackError),
}

pub trait Diagnostics: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Emits every diagnostic as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::ScriptLog { message } => {
                tracing::info!(target: targets::SCRIPT, "{message}");
            }
            Diagnostic::StyleWarning { widget, warning } => {
                tracing::warn!(target: targets::CSS, ?widget, %warning, "style warning");
            }
            Diagnostic::LoadFailed(err) => {
                tracing::warn!(target: targets::HOST, script = %err.script, error = %err.source, "script load failed");
            }
            Diagnostic::CallbackFailed(err) => {
                tracing::warn!(target: targets::SCHEDULER, window = ?err.window, error = %err.source, "update callback failed");
            }
        }
    }
}

/// Keeps every diagnostic in memory, and optionally forwards to tracing.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
    forward: bool,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit each diagnostic through [`TracingDiagnostics`].
    pub fn forwarding() -> Self {
        Self { entries: Mutex::default(), forward: true }
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Messages from the `log` global, in order.
    pub fn logs(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::ScriptLog { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn style_warnings(&self) -> Vec<StyleParseWarning> {
        self.entries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::StyleWarning { warning, .. } => Some(warning.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn load_failures(&self) -> Vec<LoadError> {
        self.entries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::LoadFailed(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn callback_failures(&self) -> Vec<CallbackError> {
        self.entries
            .lock()
            .iter()
            .filter_map(|d| match d {
                Diagnostic::CallbackFailed(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        if self.forward {
            TracingDiagnostics.report(diagnostic.clone());
        }
        self.entries.lock().push(diagnostic);
    }
}
