//! Node types: WidgetId, WidgetKind, WidgetData.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use slotmap::new_key_type;

use crate::css::cascade::StyleRule;
use crate::css::styles::ResolvedStyle;
use crate::geometry::{Edge, Margins, Size};

new_key_type! {
    /// Unique identifier for a widget. Copy, lightweight (u64).
    ///
    /// Generational: a destroyed widget's id never resolves again, even after
    /// its slot is reused.
    pub struct WidgetId;
}

/// The three widget kinds scripts can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Window,
    Container,
    Label,
}

impl WidgetKind {
    /// The name used in style selectors and script-facing messages.
    pub const fn type_name(self) -> &'static str {
        match self {
            WidgetKind::Window => "window",
            WidgetKind::Container => "box",
            WidgetKind::Label => "label",
        }
    }

    /// Look up a kind by selector name (case-insensitive).
    pub fn from_type_name(name: &str) -> Option<WidgetKind> {
        [WidgetKind::Window, WidgetKind::Container, WidgetKind::Label]
            .into_iter()
            .find(|kind| kind.type_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Container stacking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            _ => Err(()),
        }
    }
}

/// Compositor stacking layer for an overlay window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Background,
    Bottom,
    Top,
    Overlay,
}

/// Window-only state.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowData {
    pub title: String,
    pub size: Size,
    /// Starts hidden; `show` flips it once.
    pub visible: bool,
    /// `None` means no periodic update.
    pub update_interval: Option<Duration>,
    pub layer: Layer,
    /// Edges the window is pinned to; margins offset from these.
    pub anchors: Vec<Edge>,
}

/// Container-only state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerData {
    pub orientation: Orientation,
    /// Gap between children, in pixels.
    pub spacing: u32,
}

/// Label-only state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelData {
    pub text: String,
    /// Size given at creation; feeds the label's default `font-size`.
    pub font_size: u32,
}

/// Kind-specific widget state.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetBody {
    Window(WindowData),
    Container(ContainerData),
    Label(LabelData),
}

/// Data associated with a single widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetData {
    pub body: WidgetBody,
    pub margins: Margins,
    /// At most one attached block; `set_css` replaces it.
    pub style_rule: Option<StyleRule>,
    /// Kept current by the tree after every structural or style change.
    pub style: ResolvedStyle,
}

impl WidgetData {
    fn with_body(body: WidgetBody) -> Self {
        Self {
            body,
            margins: Margins::NONE,
            style_rule: None,
            style: ResolvedStyle::new(),
        }
    }

    pub fn window(title: impl Into<String>, size: Size, layer: Layer, anchors: Vec<Edge>) -> Self {
        Self::with_body(WidgetBody::Window(WindowData {
            title: title.into(),
            size,
            visible: false,
            update_interval: None,
            layer,
            anchors,
        }))
    }

    pub fn container(orientation: Orientation, spacing: u32) -> Self {
        Self::with_body(WidgetBody::Container(ContainerData { orientation, spacing }))
    }

    pub fn label(text: impl Into<String>, font_size: u32) -> Self {
        Self::with_body(WidgetBody::Label(LabelData { text: text.into(), font_size }))
    }

    pub fn kind(&self) -> WidgetKind {
        match self.body {
            WidgetBody::Window(_) => WidgetKind::Window,
            WidgetBody::Container(_) => WidgetKind::Container,
            WidgetBody::Label(_) => WidgetKind::Label,
        }
    }

    pub fn as_window(&self) -> Option<&WindowData> {
        match &self.body {
            WidgetBody::Window(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_window_mut(&mut self) -> Option<&mut WindowData> {
        match &mut self.body {
            WidgetBody::Window(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerData> {
        match &self.body {
            WidgetBody::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&LabelData> {
        match &self.body {
            WidgetBody::Label(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_label_mut(&mut self) -> Option<&mut LabelData> {
        match &mut self.body {
            WidgetBody::Label(l) => Some(l),
            _ => None,
        }
    }

    /// The creation font size, for labels.
    pub fn label_font_size(&self) -> Option<u32> {
        self.as_label().map(|l| l.font_size)
    }
}
