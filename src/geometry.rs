//! Pixel geometry shared by the widget tree, layout, and snapshots.
//!
//! All values are in surface pixels. Regions are relative to the owning
//! window's top-left corner.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Largest pixel value a script may pass for a size, margin, or spacing.
pub const MAX_PX: u32 = 65_535;

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// A 2D size in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// A positioned rectangle, in pixels relative to the window origin.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const EMPTY: Region = Region { x: 0, y: 0, width: 0, height: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    #[inline]
    pub const fn right(self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge.
    #[inline]
    pub const fn bottom(self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    #[inline]
    pub const fn size(self) -> Size {
        Size { width: self.width, height: self.height }
    }

    /// True if `other` lies entirely inside `self`.
    #[inline]
    pub const fn contains_region(self, other: Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// One side of a widget or window.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    pub const fn as_str(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
            Edge::Right => "right",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edge {
    type Err = ();

    /// Edge names are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Edge::Top),
            "bottom" => Ok(Edge::Bottom),
            "left" => Ok(Edge::Left),
            "right" => Ok(Edge::Right),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Margins
// ---------------------------------------------------------------------------

/// Per-edge optional pixel offsets.
///
/// An unset edge differs from an explicit zero: for windows, the compositor
/// only applies margins that were set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Margins {
    pub top: Option<u32>,
    pub bottom: Option<u32>,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl Margins {
    pub const NONE: Margins = Margins { top: None, bottom: None, left: None, right: None };

    pub fn get(&self, edge: Edge) -> Option<u32> {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
            Edge::Right => self.right,
        }
    }

    pub fn set(&mut self, edge: Edge, px: u32) {
        let slot = match edge {
            Edge::Top => &mut self.top,
            Edge::Bottom => &mut self.bottom,
            Edge::Left => &mut self.left,
            Edge::Right => &mut self.right,
        };
        *slot = Some(px);
    }

    /// Resolved to concrete spacing, unset edges as zero.
    pub fn to_spacing(self) -> Spacing {
        Spacing {
            top: self.top.unwrap_or(0),
            right: self.right.unwrap_or(0),
            bottom: self.bottom.unwrap_or(0),
            left: self.left.unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Margins::NONE
    }
}

// ---------------------------------------------------------------------------
// Spacing
// ---------------------------------------------------------------------------

/// Concrete per-edge spacing (padding or resolved margins) in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Spacing {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Spacing {
    pub const ZERO: Spacing = Spacing { top: 0, right: 0, bottom: 0, left: 0 };

    #[inline]
    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self { top, right, bottom, left }
    }

    #[inline]
    pub const fn all(value: u32) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }

    /// Left + right.
    #[inline]
    pub const fn width(self) -> u32 {
        self.left.saturating_add(self.right)
    }

    /// Top + bottom.
    #[inline]
    pub const fn height(self) -> u32 {
        self.top.saturating_add(self.bottom)
    }

    /// Field-wise saturating sum, used to stack a style margin on a
    /// set_margin offset.
    #[inline]
    pub const fn add(self, other: Spacing) -> Spacing {
        Spacing {
            top: self.top.saturating_add(other.top),
            right: self.right.saturating_add(other.right),
            bottom: self.bottom.saturating_add(other.bottom),
            left: self.left.saturating_add(other.left),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_edges() {
        let r = Region::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.size(), Size::new(30, 40));
    }

    #[test]
    fn spacing_sums_saturate() {
        let wide = Spacing::new(0, u32::MAX, 0, 10);
        assert_eq!(wide.width(), u32::MAX);
        assert_eq!(wide.add(Spacing::all(5)).right, u32::MAX);
        assert_eq!(Spacing::all(u32::MAX).height(), u32::MAX);
        assert_eq!(Region::new(10, 0, u32::MAX, 1).right(), i32::MAX);
    }

    #[test]
    fn region_contains_region() {
        let outer = Region::new(0, 0, 200, 100);
        assert!(outer.contains_region(Region::new(5, 5, 50, 20)));
        assert!(outer.contains_region(outer));
        assert!(!outer.contains_region(Region::new(190, 0, 20, 10)));
    }

    #[test]
    fn edge_parses_case_insensitively() {
        assert_eq!("TOP".parse::<Edge>(), Ok(Edge::Top));
        assert_eq!("left".parse::<Edge>(), Ok(Edge::Left));
        assert!("middle".parse::<Edge>().is_err());
        assert!("".parse::<Edge>().is_err());
    }

    #[test]
    fn edge_display_round_trips() {
        for edge in Edge::ALL {
            assert_eq!(edge.to_string().parse::<Edge>(), Ok(edge));
        }
    }

    #[test]
    fn margins_distinguish_unset_from_zero() {
        let mut m = Margins::NONE;
        assert!(m.is_empty());
        m.set(Edge::Top, 0);
        assert!(!m.is_empty());
        assert_eq!(m.get(Edge::Top), Some(0));
        assert_eq!(m.get(Edge::Left), None);
    }

    #[test]
    fn margins_to_spacing() {
        let mut m = Margins::NONE;
        m.set(Edge::Top, 10);
        m.set(Edge::Right, 4);
        assert_eq!(m.to_spacing(), Spacing::new(10, 4, 0, 0));
    }

    #[test]
    fn spacing_totals() {
        let s = Spacing::new(1, 2, 3, 4);
        assert_eq!(s.width(), 6);
        assert_eq!(s.height(), 4);
        assert_eq!(s.add(Spacing::all(1)), Spacing::new(2, 3, 4, 5));
    }

    #[test]
    fn size_display() {
        assert_eq!(Size::new(200, 100).to_string(), "200x100");
    }
}
