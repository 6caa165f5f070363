//! Widget tree: slotmap-backed arena, immutable snapshots, and the shared
//! handle that publishes them.

pub mod node;
pub mod shared;
pub mod snapshot;
pub mod tree;

pub use node::{ContainerData, LabelData, Layer, Orientation, WidgetBody, WidgetData, WidgetId, WidgetKind, WindowData};
pub use shared::{BatchGuard, SharedTree, SnapshotReader};
pub use snapshot::{NodeSnapshot, TreeSnapshot};
pub use tree::{WidgetTree, WindowPlacement};
