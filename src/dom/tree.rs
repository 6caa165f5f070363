//! The widget tree: windows, containers, and labels in a slotmap arena.
//!
//! Every mutation validates its target, applies the change, keeps resolved
//! styles current, and bumps the tree revision. Structural rules:
//!
//! - a window holds at most one child
//! - containers hold any number of children, appended in order
//! - labels are leaves
//! - parents never change once a widget is attached

use std::collections::VecDeque;
use std::time::Duration;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{Layer, Orientation, WidgetData, WidgetId, WidgetKind};
use super::snapshot::TreeSnapshot;
use crate::css::cascade::{self, CascadeInput, CompiledRules, StyleRule};
use crate::css::parser::StyleParseWarning;
use crate::css::styles::ResolvedStyle;
use crate::error::{HostError, HostResult};
use crate::geometry::{Edge, Size};
use crate::logging::targets;

/// Empty slice constant for returning when a widget has no children.
const EMPTY_CHILDREN: &[WidgetId] = &[];

/// Layer and anchors given to every new window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlacement {
    pub layer: Layer,
    pub anchors: Vec<Edge>,
}

impl Default for WindowPlacement {
    fn default() -> Self {
        Self { layer: Layer::Background, anchors: vec![Edge::Top, Edge::Left] }
    }
}

/// The live widget tree.
///
/// Windows are roots. Parent/child relationships are stored in secondary maps
/// so that destroying a window is O(subtree size) and lookup is O(1).
#[derive(Debug, Default)]
pub struct WidgetTree {
    nodes: SlotMap<WidgetId, WidgetData>,
    children: SecondaryMap<WidgetId, Vec<WidgetId>>,
    parent: SecondaryMap<WidgetId, WidgetId>,
    /// Live windows in creation order.
    windows: Vec<WidgetId>,
    revision: u64,
    /// Host-level block applied outside every window's own blocks.
    host_rules: Option<StyleRule>,
    placement: WindowPlacement,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layer and anchors for windows created from now on.
    pub fn set_window_placement(&mut self, placement: WindowPlacement) {
        self.placement = placement;
    }

    /// Install (or clear, with blank text) the host-level style block and
    /// restyle every window.
    pub fn set_host_css(&mut self, source: &str) -> Vec<StyleParseWarning> {
        let warnings = if source.trim().is_empty() {
            self.host_rules = None;
            Vec::new()
        } else {
            let (rule, warnings) = StyleRule::parse(source);
            self.host_rules = Some(rule);
            warnings
        };
        for window in self.windows.clone() {
            self.restyle_subtree(window);
        }
        self.bump();
        warnings
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a hidden top-level window.
    pub fn create_window(&mut self, title: impl Into<String>, width: u32, height: u32) -> HostResult<WidgetId> {
        if width == 0 || height == 0 {
            return Err(HostError::invalid_argument(
                "create_window",
                format!("size must be positive, got {width}x{height}"),
            ));
        }
        let data = WidgetData::window(
            title,
            Size::new(width, height),
            self.placement.layer,
            self.placement.anchors.clone(),
        );
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.windows.push(id);
        self.resolve_one(id);
        self.bump();
        tracing::debug!(target: targets::DOM, ?id, width, height, "window created");
        Ok(id)
    }

    /// Append a container to `parent`.
    pub fn add_container(&mut self, parent: WidgetId, orientation: Orientation, spacing: u32) -> HostResult<WidgetId> {
        self.attach(parent, WidgetData::container(orientation, spacing))
    }

    /// Append a label to `parent`.
    pub fn add_label(&mut self, parent: WidgetId, text: impl Into<String>, font_size: u32) -> HostResult<WidgetId> {
        if font_size == 0 {
            return Err(HostError::invalid_argument("add_label", "font size must be positive"));
        }
        self.attach(parent, WidgetData::label(text, font_size))
    }

    fn attach(&mut self, parent: WidgetId, data: WidgetData) -> HostResult<WidgetId> {
        let parent_kind = self
            .kind(parent)
            .ok_or_else(|| HostError::invalid_parent(parent, "parent widget does not exist"))?;
        match parent_kind {
            WidgetKind::Label => return Err(HostError::invalid_parent(parent, "labels cannot have children")),
            WidgetKind::Window if !self.children(parent).is_empty() => {
                return Err(HostError::invalid_parent(parent, "a window holds a single child"));
            }
            _ => {}
        }

        let kind = data.kind();
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        self.resolve_one(id);
        self.bump();
        tracing::trace!(target: targets::DOM, ?id, ?parent, %kind, "widget attached");
        Ok(id)
    }

    /// Replace a label's text. The label keeps its identity.
    pub fn set_text(&mut self, id: WidgetId, text: impl Into<String>) -> HostResult<()> {
        let node = self.nodes.get_mut(id).ok_or(HostError::UnknownWidget(id))?;
        let kind = node.kind();
        let label = node
            .as_label_mut()
            .ok_or_else(|| HostError::invalid_argument("set_text", format!("a {kind} has no text")))?;
        label.text = text.into();
        self.bump();
        Ok(())
    }

    /// Set one margin edge, in pixels.
    pub fn set_margin(&mut self, id: WidgetId, edge: Edge, px: u32) -> HostResult<()> {
        let node = self.nodes.get_mut(id).ok_or(HostError::UnknownWidget(id))?;
        node.margins.set(edge, px);
        self.bump();
        Ok(())
    }

    /// Attach a style block to `id`, replacing any earlier one, and restyle
    /// the widget's subtree before returning.
    ///
    /// Malformed rule text never fails; problems come back as warnings.
    pub fn set_css(&mut self, id: WidgetId, source: impl Into<String>) -> HostResult<Vec<StyleParseWarning>> {
        if !self.nodes.contains_key(id) {
            return Err(HostError::UnknownWidget(id));
        }
        let (rule, warnings) = StyleRule::parse(source);
        if let Some(node) = self.nodes.get_mut(id) {
            node.style_rule = Some(rule);
        }
        self.restyle_subtree(id);
        self.bump();
        for warning in &warnings {
            tracing::debug!(target: targets::CSS, ?id, %warning, "style warning");
        }
        Ok(warnings)
    }

    /// Mark a window visible. Showing a visible window changes nothing.
    pub fn show(&mut self, id: WidgetId) -> HostResult<()> {
        let window = self.window_mut(id, "show")?;
        if !window.visible {
            window.visible = true;
            self.bump();
        }
        Ok(())
    }

    /// Record a window's update interval for the snapshot.
    pub fn set_update_interval(&mut self, id: WidgetId, interval: Option<Duration>) -> HostResult<()> {
        let window = self.window_mut(id, "set_update_interval")?;
        window.update_interval = interval;
        self.bump();
        Ok(())
    }

    fn window_mut(&mut self, id: WidgetId, call: &str) -> HostResult<&mut super::node::WindowData> {
        let node = self.nodes.get_mut(id).ok_or(HostError::UnknownWidget(id))?;
        let kind = node.kind();
        node.as_window_mut()
            .ok_or_else(|| HostError::invalid_argument(call, format!("expected a window, got a {kind}")))
    }

    /// Destroy a window and its whole subtree. Returns the removed ids,
    /// window first.
    pub fn destroy_window(&mut self, id: WidgetId) -> HostResult<Vec<WidgetId>> {
        match self.kind(id) {
            None => return Err(HostError::UnknownWidget(id)),
            Some(WidgetKind::Window) => {}
            Some(kind) => {
                return Err(HostError::invalid_argument("close", format!("expected a window, got a {kind}")));
            }
        }

        let mut removed = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            if self.nodes.remove(current).is_some() {
                removed.push(current);
            }
        }
        self.windows.retain(|&w| w != id);
        self.bump();
        tracing::debug!(target: targets::DOM, ?id, removed = removed.len(), "window destroyed");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Deep copy of the tree with layout, for the renderer.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot::capture(self)
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetData> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.nodes.get(id).map(WidgetData::kind)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parent.get(id).copied()
    }

    /// Children in insertion order. Empty for leaves and unknown ids.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the window.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// The window a widget belongs to (itself, for windows).
    pub fn window_of(&self, id: WidgetId) -> Option<WidgetId> {
        if !self.contains(id) {
            return None;
        }
        Some(self.ancestors(id).last().copied().unwrap_or(id))
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Live windows in creation order.
    pub fn windows(&self) -> &[WidgetId] {
        &self.windows
    }

    pub fn resolved_style(&self, id: WidgetId) -> Option<&ResolvedStyle> {
        self.nodes.get(id).map(|n| &n.style)
    }

    /// Incremented by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Styling
    // -----------------------------------------------------------------------

    fn resolve_one(&mut self, id: WidgetId) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };

        let mut blocks: Vec<&CompiledRules> = Vec::new();
        if let Some(host) = &self.host_rules {
            blocks.push(host.compiled());
        }
        for ancestor in self.ancestors(id).into_iter().rev() {
            if let Some(rule) = self.nodes.get(ancestor).and_then(|n| n.style_rule.as_ref()) {
                blocks.push(rule.compiled());
            }
        }

        let style = cascade::resolve(CascadeInput {
            kind: data.kind(),
            label_font_size: data.label_font_size(),
            parent: self.parent(id).and_then(|p| self.nodes.get(p)).map(|n| &n.style),
            ancestors: &blocks,
            own: data.style_rule.as_ref().map(StyleRule::compiled),
        });

        if let Some(node) = self.nodes.get_mut(id) {
            node.style = style;
        }
    }

    /// Re-resolve `id` and every descendant, parents before children.
    fn restyle_subtree(&mut self, id: WidgetId) {
        for node in self.walk_depth_first(id) {
            self.resolve_one(node);
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
