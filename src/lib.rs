//! # swaydgets
//!
//! Host runtime for scripted desktop overlay widgets.
//!
//! A script builds a small tree of windows, boxes, and labels through a
//! binding layer, styles it with CSS-like rule blocks, and registers
//! per-window callbacks that a scheduler re-invokes on a drift-free grid.
//! The renderer never touches the live tree: it reads immutable snapshots
//! published after every mutation batch.
//!
//! ## Core Systems
//!
//! - **[`css`]**: tokenizer, fault-tolerant parser, typed properties, cascade
//! - **[`dom`]**: slotmap-backed widget tree, snapshots, and the shared publisher
//! - **[`layout`]**: taffy-powered box stacking for snapshot regions
//! - **[`host`]**: script boundary values, bindings, script loading, JSON fetching, diagnostics
//! - **[`scheduler`]**: per-window update registrations on a monotonic clock
//! - **[`app`]**: configuration and the script thread
//! - **[`testing`]**: headless pilot on simulated time, snapshot outlines
//! - **[`geometry`]**: Size, Region, Edge, Margins, Spacing primitives

// Foundation
pub mod error;
pub mod geometry;
pub mod logging;

// Core systems
pub mod css;
pub mod dom;
pub mod layout;

// Scripting
pub mod host;
pub mod scheduler;

// Application
pub mod app;
pub mod testing;

pub use app::{App, AppConfig, AppError, ConfigError};
pub use dom::{SnapshotReader, TreeSnapshot, WidgetId};
pub use error::{CallbackError, FetchError, HostError, HostResult, LoadError, ScriptError};
pub use host::{Callback, FnScript, Script, ScriptHost, Value, WidgetHandle};
