//! Layout engine: taffy box stacking for each window.

pub mod engine;
pub mod resolve;

pub use engine::LayoutEngine;
