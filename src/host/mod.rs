//! Script host: the binding layer scripts call into, plus script loading,
//! JSON fetching and diagnostics.

pub mod api;
pub mod diagnostics;
pub mod fetch;
pub mod script;
pub mod value;

pub use api::{methods_of, HostOptions, ScriptHost};
pub use diagnostics::{Diagnostic, Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use fetch::{HttpFetcher, JsonFetcher};
pub use script::{FnScript, Script};
pub use value::{Args, Callable, Callback, Value, WidgetHandle};
