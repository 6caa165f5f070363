//! Error types for the host runtime.
//!
//! [`HostError`] is what a binding call returns to the calling script frame.
//! [`LoadError`] and [`CallbackError`] wrap a [`ScriptError`] with the entry
//! point that failed; both are reported to diagnostics and never abort the
//! host.

use crate::dom::WidgetId;
use crate::scheduler::RegistrationId;

/// Result type alias for binding calls.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Synchronous failure of a binding call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// Wrong arity, type, or range.
    #[error("{call}: {message}")]
    InvalidArgument { call: String, message: String },

    /// The handle refers to a destroyed widget.
    #[error("unknown widget {0:?}")]
    UnknownWidget(WidgetId),

    /// The parent cannot accept this child.
    #[error("invalid parent {parent:?}: {reason}")]
    InvalidParent { parent: WidgetId, reason: String },

    /// `fetch_json` could not produce a document.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Why `fetch_json` failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("failed to fetch {url}: {message}")]
    Request { url: String, message: String },

    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to parse JSON from {url}: {message}")]
    Decode { url: String, message: String },
}

impl HostError {
    pub fn invalid_argument(call: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument { call: call.into(), message: message.into() }
    }

    pub fn invalid_parent(parent: WidgetId, reason: impl Into<String>) -> Self {
        Self::InvalidParent { parent, reason: reason.into() }
    }
}

/// Failure raised by a script body or callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// A binding call failed and the script did not handle it.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The script itself raised an error.
    #[error("{0}")]
    Runtime(String),
}

impl ScriptError {
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}

/// A script's top-level body failed; everything it created was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load script '{script}': {source}")]
pub struct LoadError {
    pub script: String,
    #[source]
    pub source: ScriptError,
}

/// A scheduled update callback failed. Its registration stays armed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("update callback for window {window:?} failed: {source}")]
pub struct CallbackError {
    pub window: WidgetId,
    pub registration: RegistrationId,
    #[source]
    pub source: ScriptError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn widget() -> WidgetId {
        WidgetId::from(KeyData::from_ffi(1))
    }

    #[test]
    fn invalid_argument_display() {
        let err = HostError::invalid_argument("set_margin", "unknown edge `middle`");
        assert_eq!(err.to_string(), "set_margin: unknown edge `middle`");
    }

    #[test]
    fn host_error_converts_into_script_error() {
        let err: ScriptError = HostError::UnknownWidget(widget()).into();
        assert!(matches!(err, ScriptError::Host(HostError::UnknownWidget(_))));
    }

    #[test]
    fn script_error_is_transparent_over_host_error() {
        let host = HostError::invalid_parent(widget(), "labels cannot have children");
        let script = ScriptError::from(host.clone());
        assert_eq!(script.to_string(), host.to_string());
    }

    #[test]
    fn fetch_error_passes_through_host_error() {
        let err = HostError::from(FetchError::Status { url: "http://x/".into(), status: 503 });
        assert_eq!(err.to_string(), "HTTP error 503 from http://x/");
    }

    #[test]
    fn load_error_names_script() {
        let err = LoadError { script: "clock".into(), source: ScriptError::runtime("boom") };
        assert_eq!(err.to_string(), "failed to load script 'clock': boom");
    }
}
