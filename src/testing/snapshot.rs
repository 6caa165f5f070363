//! Snapshot rendering helpers.
//!
//! Turn a [`TreeSnapshot`] into an indented plain-text outline, one widget
//! per line, for assertions and inline snapshots.

use std::fmt::Write;

use crate::dom::{NodeSnapshot, TreeSnapshot, WidgetBody, WidgetId};

/// Outline of every window, in creation order.
///
/// ```text
/// window "Hello Widget" 200x100 visible
///   box vertical spacing=5
///     label "Hello, World!" size=18
/// ```
pub fn snapshot_to_string(snapshot: &TreeSnapshot) -> String {
    outline(snapshot, describe)
}

/// Like [`snapshot_to_string`], with each widget's laid-out region.
pub fn regions_to_string(snapshot: &TreeSnapshot) -> String {
    outline(snapshot, |node| {
        let r = node.region;
        format!("{} @{},{} {}x{}", node.kind(), r.x, r.y, r.width, r.height)
    })
}

fn outline(snapshot: &TreeSnapshot, line: impl Fn(&NodeSnapshot) -> String) -> String {
    let mut out = String::new();
    for &window in &snapshot.windows {
        let mut stack: Vec<(WidgetId, usize)> = vec![(window, 0)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = snapshot.node(id) else {
                continue;
            };
            let _ = writeln!(out, "{:indent$}{}", "", line(node), indent = depth * 2);
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn describe(node: &NodeSnapshot) -> String {
    match &node.body {
        WidgetBody::Window(window) => {
            let mut line = format!(
                "window {:?} {} {}",
                window.title,
                window.size,
                if window.visible { "visible" } else { "hidden" }
            );
            if let Some(interval) = window.update_interval {
                let _ = write!(line, " every {interval:?}");
            }
            line
        }
        WidgetBody::Container(container) => {
            format!("box {} spacing={}", container.orientation, container.spacing)
        }
        WidgetBody::Label(label) => format!("label {:?} size={}", label.text, label.font_size),
    }
}
