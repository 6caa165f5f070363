//! Headless testing tools: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to load scripts and step simulated time without a
//! script thread. Use [`snapshot_to_string`] to capture a published tree as
//! plain text for snapshot-style assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{regions_to_string, snapshot_to_string};
