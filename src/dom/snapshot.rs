//! Immutable deep copies of the widget tree, handed to the renderer.

use std::collections::HashMap;

use super::node::{WidgetBody, WidgetData, WidgetId, WidgetKind};
use super::tree::WidgetTree;
use crate::css::styles::ResolvedStyle;
use crate::geometry::{Margins, Region};
use crate::layout::LayoutEngine;
use crate::logging::targets;

/// One widget as it was when the snapshot was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: WidgetId,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    pub body: WidgetBody,
    pub margins: Margins,
    pub style: ResolvedStyle,
    /// The attached rule text, verbatim.
    pub style_source: Option<String>,
    /// Position and size relative to the window origin.
    pub region: Region,
}

impl NodeSnapshot {
    fn capture(tree: &WidgetTree, id: WidgetId, data: &WidgetData, region: Region) -> Self {
        Self {
            id,
            parent: tree.parent(id),
            children: tree.children(id).to_vec(),
            body: data.body.clone(),
            margins: data.margins,
            style: data.style.clone(),
            style_source: data.style_rule.as_ref().map(|r| r.source().to_string()),
            region,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self.body {
            WidgetBody::Window(_) => WidgetKind::Window,
            WidgetBody::Container(_) => WidgetKind::Container,
            WidgetBody::Label(_) => WidgetKind::Label,
        }
    }

    /// Label text, for labels.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            WidgetBody::Label(label) => Some(&label.text),
            _ => None,
        }
    }
}

/// A consistent view of every live window at one tree revision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSnapshot {
    pub revision: u64,
    /// Windows in creation order.
    pub windows: Vec<WidgetId>,
    pub nodes: HashMap<WidgetId, NodeSnapshot>,
}

impl TreeSnapshot {
    /// Copy the tree and lay out each window.
    pub fn capture(tree: &WidgetTree) -> Self {
        let mut nodes = HashMap::with_capacity(tree.len());

        for &window in tree.windows() {
            let regions = LayoutEngine::compute_window(tree, window).unwrap_or_else(|err| {
                tracing::warn!(target: targets::DOM, ?window, %err, "layout failed");
                HashMap::new()
            });
            for id in tree.walk_depth_first(window) {
                if let Some(data) = tree.get(id) {
                    let region = regions.get(&id).copied().unwrap_or(Region::EMPTY);
                    nodes.insert(id, NodeSnapshot::capture(tree, id, data, region));
                }
            }
        }

        Self { revision: tree.revision(), windows: tree.windows().to_vec(), nodes }
    }

    pub fn node(&self, id: WidgetId) -> Option<&NodeSnapshot> {
        self.nodes.get(&id)
    }

    /// Pre-order walk from `start`.
    pub fn walk(&self, start: WidgetId) -> Vec<&NodeSnapshot> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                result.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        result
    }

    /// Texts of all labels under `window`, in render order.
    pub fn label_texts(&self, window: WidgetId) -> Vec<&str> {
        self.walk(window).into_iter().filter_map(NodeSnapshot::text).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::Orientation;
    use crate::geometry::Edge;

    fn tree() -> (WidgetTree, WidgetId, WidgetId, WidgetId) {
        let mut tree = WidgetTree::new();
        let window = tree.create_window("Hello Widget", 200, 100).unwrap();
        let col = tree.add_container(window, Orientation::Vertical, 5).unwrap();
        let label = tree.add_label(col, "Hello, World!", 18).unwrap();
        tree.add_label(col, "Updates: 0", 14).unwrap();
        (tree, window, col, label)
    }

    #[test]
    fn snapshot_is_isomorphic_to_tree() {
        let (tree, window, ..) = tree();
        let snap = tree.snapshot();
        assert_eq!(snap.len(), tree.len());
        assert_eq!(snap.windows, tree.windows());
        for id in tree.walk_depth_first(window) {
            let node = snap.node(id).unwrap();
            assert_eq!(node.parent, tree.parent(id));
            assert_eq!(node.children, tree.children(id));
            assert_eq!(node.kind(), tree.kind(id).unwrap());
            assert_eq!(&node.style, tree.resolved_style(id).unwrap());
        }
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let (mut tree, window, _, label) = tree();
        let before = tree.snapshot();
        tree.set_text(label, "changed").unwrap();
        tree.set_margin(window, Edge::Top, 4).unwrap();
        assert_eq!(before.node(label).unwrap().text(), Some("Hello, World!"));
        assert!(before.node(window).unwrap().margins.is_empty());
        assert!(tree.snapshot().revision > before.revision);
    }

    #[test]
    fn label_texts_in_render_order() {
        let (tree, window, ..) = tree();
        assert_eq!(tree.snapshot().label_texts(window), vec!["Hello, World!", "Updates: 0"]);
    }

    #[test]
    fn style_source_is_kept_verbatim() {
        let (mut tree, _, col, _) = tree();
        tree.set_css(col, "label {  color: red; }").unwrap();
        let snap = tree.snapshot();
        assert_eq!(snap.node(col).unwrap().style_source.as_deref(), Some("label {  color: red; }"));
    }

    #[test]
    fn regions_are_filled() {
        let (tree, window, _, label) = tree();
        let snap = tree.snapshot();
        assert_eq!(snap.node(window).unwrap().region, Region::new(0, 0, 200, 100));
        assert!(snap.node(label).unwrap().region.width > 0);
    }

    #[test]
    fn destroyed_windows_leave_the_snapshot() {
        let (mut tree, window, ..) = tree();
        tree.destroy_window(window).unwrap();
        let snap = tree.snapshot();
        assert!(snap.is_empty());
        assert!(snap.windows.is_empty());
    }
}
