//! TaffyTree wrapper for per-window layout.
//!
//! [`LayoutEngine`] mirrors one window's subtree into a taffy tree, runs
//! flexbox layout at the window's size, and reports [`Region`]s relative to
//! the window origin.

use std::collections::HashMap;

use taffy::prelude::*;

use crate::dom::node::WidgetId;
use crate::dom::tree::WidgetTree;
use crate::geometry::Region;

use super::resolve::widget_style;

/// Maps widgets to taffy nodes for one window.
pub struct LayoutEngine {
    tree: TaffyTree<()>,
    node_map: HashMap<WidgetId, NodeId>,
    root: Option<(WidgetId, NodeId)>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            node_map: HashMap::new(),
            root: None,
        }
    }

    /// Build the taffy tree for `window` and lay it out.
    pub fn compute_window(widgets: &WidgetTree, window: WidgetId) -> taffy::TaffyResult<HashMap<WidgetId, Region>> {
        let mut engine = Self::new();
        engine.sync(widgets, window)?;
        engine.compute(widgets, window)?;
        Ok(engine.regions(widgets))
    }

    /// Mirror `window`'s subtree. Children are created before their parent.
    fn sync(&mut self, widgets: &WidgetTree, window: WidgetId) -> taffy::TaffyResult<()> {
        let root = self.build(widgets, window)?;
        self.root = Some((window, root));
        Ok(())
    }

    fn build(&mut self, widgets: &WidgetTree, id: WidgetId) -> taffy::TaffyResult<NodeId> {
        let style = widgets.get(id).map(widget_style).unwrap_or_default();
        let kids = widgets
            .children(id)
            .iter()
            .map(|&child| self.build(widgets, child))
            .collect::<taffy::TaffyResult<Vec<_>>>()?;
        let node = if kids.is_empty() {
            self.tree.new_leaf(style)?
        } else {
            self.tree.new_with_children(style, &kids)?
        };
        self.node_map.insert(id, node);
        Ok(node)
    }

    fn compute(&mut self, widgets: &WidgetTree, window: WidgetId) -> taffy::TaffyResult<()> {
        let Some((_, root)) = self.root else {
            return Ok(());
        };
        let size = widgets
            .get(window)
            .and_then(|w| w.as_window())
            .map(|w| w.size)
            .unwrap_or_default();
        self.tree.compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(size.width as f32),
                height: AvailableSpace::Definite(size.height as f32),
            },
        )
    }

    /// Absolute regions, accumulated from taffy's parent-relative locations.
    fn regions(&self, widgets: &WidgetTree) -> HashMap<WidgetId, Region> {
        let mut result = HashMap::new();
        let Some((window, _)) = self.root else {
            return result;
        };

        let mut stack = vec![(window, 0.0f32, 0.0f32)];
        while let Some((id, parent_x, parent_y)) = stack.pop() {
            let Some(layout) = self.node_map.get(&id).and_then(|&n| self.tree.layout(n).ok()) else {
                continue;
            };
            let x = parent_x + layout.location.x;
            let y = parent_y + layout.location.y;
            result.insert(
                id,
                Region {
                    x: x.round() as i32,
                    y: y.round() as i32,
                    width: layout.size.width.round().max(0.0) as u32,
                    height: layout.size.height.round().max(0.0) as u32,
                },
            );
            for &child in widgets.children(id) {
                stack.push((child, x, y));
            }
        }
        result
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::Orientation;

    /// Window 200x100 → vertical box (spacing 5) → two labels.
    fn fixture() -> (WidgetTree, WidgetId, WidgetId, WidgetId, WidgetId) {
        let mut tree = WidgetTree::new();
        let window = tree.create_window("Hello Widget", 200, 100).unwrap();
        let col = tree.add_container(window, Orientation::Vertical, 5).unwrap();
        let a = tree.add_label(col, "Hello, World!", 18).unwrap();
        let b = tree.add_label(col, "Updates: 0", 14).unwrap();
        (tree, window, col, a, b)
    }

    #[test]
    fn window_fills_its_size() {
        let (tree, window, ..) = fixture();
        let regions = LayoutEngine::compute_window(&tree, window).unwrap();
        assert_eq!(regions[&window], Region::new(0, 0, 200, 100));
    }

    #[test]
    fn vertical_box_stacks_with_spacing() {
        let (tree, window, col, a, b) = fixture();
        let regions = LayoutEngine::compute_window(&tree, window).unwrap();
        let (ra, rb) = (regions[&a], regions[&b]);
        // 18px * 5/4 = 22.5 → 23
        assert_eq!(ra.height, 23);
        assert_eq!(rb.y, ra.bottom() + 5);
        assert_eq!(ra.x, rb.x);
        assert!(regions[&window].contains_region(regions[&col]));
    }

    #[test]
    fn horizontal_box_places_side_by_side() {
        let mut tree = WidgetTree::new();
        let window = tree.create_window("w", 300, 50).unwrap();
        let row = tree.add_container(window, Orientation::Horizontal, 10).unwrap();
        let a = tree.add_label(row, "ab", 10).unwrap();
        let b = tree.add_label(row, "cd", 10).unwrap();
        let regions = LayoutEngine::compute_window(&tree, window).unwrap();
        assert_eq!(regions[&a].y, regions[&b].y);
        assert_eq!(regions[&b].x, regions[&a].right() + 10);
    }

    #[test]
    fn padding_offsets_children() {
        let (mut tree, window, col, a, _) = fixture();
        tree.set_css(col, "padding: 7px;").unwrap();
        let regions = LayoutEngine::compute_window(&tree, window).unwrap();
        assert_eq!(regions[&a].x, regions[&col].x + 7);
        assert_eq!(regions[&a].y, regions[&col].y + 7);
    }

    #[test]
    fn empty_window_has_only_itself() {
        let mut tree = WidgetTree::new();
        let window = tree.create_window("w", 10, 10).unwrap();
        let regions = LayoutEngine::compute_window(&tree, window).unwrap();
        assert_eq!(regions.len(), 1);
    }
}
