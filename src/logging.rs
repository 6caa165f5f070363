//! Tracing targets for the host runtime.
//!
//! The crate only emits `tracing` events; installing a subscriber is up to
//! the embedding application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("swaydgets::scheduler=trace,swaydgets=info")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Widget tree mutations and snapshot publication.
    pub const DOM: &str = "swaydgets::dom";
    /// Style parsing and cascade.
    pub const CSS: &str = "swaydgets::css";
    /// Binding calls and script loads.
    pub const HOST: &str = "swaydgets::host";
    /// Messages scripts log through `log(...)`.
    pub const SCRIPT: &str = "swaydgets::script";
    /// `fetch_json` requests.
    pub const FETCH: &str = "swaydgets::fetch";
    /// Update registrations and firings.
    pub const SCHEDULER: &str = "swaydgets::scheduler";
    /// Session thread lifecycle.
    pub const APP: &str = "swaydgets::app";
}
