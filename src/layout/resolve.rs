//! Widget → taffy Style conversion.
//!
//! Maps each widget's kind data, margins, and resolved style onto taffy's
//! flexbox types. Windows are fixed-size columns, containers are flex rows or
//! columns with `spacing` as the gap, and labels are leaves sized from an
//! estimated text metric.

use taffy::prelude::*;

use crate::dom::node::{ContainerData, LabelData, Orientation, WidgetBody, WidgetData};
use crate::geometry::Spacing;

/// Average glyph advance: 3/5 of the font size.
const GLYPH_WIDTH: (u64, u64) = (3, 5);
/// Line height: 5/4 of the font size.
const LINE_HEIGHT: (u64, u64) = (5, 4);

/// Estimated text box of a label: (width, height) in whole pixels.
///
/// `font_size` is the resolved size, which a style block may have changed
/// from the creation size.
/// Oversized results saturate at `u32::MAX`.
pub fn estimate_text_size(text: &str, font_size: u32) -> (u32, u32) {
    let lines = text.lines().count().max(1) as u64;
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u64;
    let scale = |count: u64, (num, den): (u64, u64)| {
        let px = count.saturating_mul(u64::from(font_size)).saturating_mul(num).div_ceil(den);
        u32::try_from(px).unwrap_or(u32::MAX)
    };
    (scale(widest, GLYPH_WIDTH), scale(lines, LINE_HEIGHT))
}

fn length_rect(spacing: Spacing) -> Rect<LengthPercentage> {
    Rect {
        left: LengthPercentage::from_length(spacing.left as f32),
        right: LengthPercentage::from_length(spacing.right as f32),
        top: LengthPercentage::from_length(spacing.top as f32),
        bottom: LengthPercentage::from_length(spacing.bottom as f32),
    }
}

fn margin_rect(spacing: Spacing) -> Rect<LengthPercentageAuto> {
    Rect {
        left: LengthPercentageAuto::from_length(spacing.left as f32),
        right: LengthPercentageAuto::from_length(spacing.right as f32),
        top: LengthPercentageAuto::from_length(spacing.top as f32),
        bottom: LengthPercentageAuto::from_length(spacing.bottom as f32),
    }
}

/// Convert one widget into its taffy style.
pub fn widget_style(data: &WidgetData) -> Style {
    let style = &data.style;
    let padding = style.padding();
    let border = style.length("border-width").map(Spacing::all).unwrap_or(Spacing::ZERO);
    let min_size = Size {
        width: style
            .length("min-width")
            .map_or(Dimension::AUTO, |px| Dimension::from_length(px as f32)),
        height: style
            .length("min-height")
            .map_or(Dimension::AUTO, |px| Dimension::from_length(px as f32)),
    };

    let base = Style {
        padding: length_rect(padding),
        border: length_rect(border),
        min_size,
        ..Default::default()
    };

    match &data.body {
        // Window margins are compositor offsets, not layout.
        WidgetBody::Window(window) => Style {
            flex_direction: FlexDirection::Column,
            size: Size {
                width: Dimension::from_length(window.size.width as f32),
                height: Dimension::from_length(window.size.height as f32),
            },
            ..base
        },
        WidgetBody::Container(ContainerData { orientation, spacing }) => {
            let gap = LengthPercentage::from_length(*spacing as f32);
            Style {
                flex_direction: match orientation {
                    Orientation::Vertical => FlexDirection::Column,
                    Orientation::Horizontal => FlexDirection::Row,
                },
                gap: Size { width: gap, height: gap },
                margin: margin_rect(data.margins.to_spacing().add(style.margin())),
                ..base
            }
        }
        WidgetBody::Label(LabelData { text, font_size }) => {
            let px = style.length("font-size").unwrap_or(*font_size);
            let (w, h) = estimate_text_size(text, px);
            Style {
                size: Size {
                    width: Dimension::from_length(w.saturating_add(padding.width()).saturating_add(border.width()) as f32),
                    height: Dimension::from_length(h.saturating_add(padding.height()).saturating_add(border.height()) as f32),
                },
                margin: margin_rect(data.margins.to_spacing().add(style.margin())),
                flex_shrink: 0.0,
                ..base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::properties::PropertyValue;
    use crate::dom::node::Layer;
    use crate::geometry::{Edge, Size as PxSize};

    #[test]
    fn text_estimate_uses_widest_line() {
        assert_eq!(estimate_text_size("abcd", 10), (24, 13));
        assert_eq!(estimate_text_size("ab\nabcd", 10), (24, 25));
        assert_eq!(estimate_text_size("", 10), (0, 13));
    }

    #[test]
    fn text_estimate_saturates() {
        assert_eq!(estimate_text_size("Hello", 1_000_000_000), (3_000_000_000, 1_250_000_000));
        assert_eq!(estimate_text_size(&"x".repeat(10_000), u32::MAX), (u32::MAX, u32::MAX));
    }

    #[test]
    fn huge_label_style_does_not_overflow() {
        let mut data = WidgetData::label("Hello", 10);
        data.margins.set(Edge::Left, u32::MAX);
        data.style.set("margin-left", PropertyValue::Length(10));
        data.style.set("padding-left", PropertyValue::Length(u32::MAX));
        data.style.set("border-width", PropertyValue::Length(u32::MAX));
        let style = widget_style(&data);
        assert_eq!(style.margin.left, LengthPercentageAuto::from_length(u32::MAX as f32));
        assert_eq!(style.size.width, Dimension::from_length(u32::MAX as f32));
    }

    #[test]
    fn window_is_fixed_column() {
        let data = WidgetData::window("w", PxSize::new(200, 100), Layer::Background, vec![]);
        let style = widget_style(&data);
        assert_eq!(style.flex_direction, FlexDirection::Column);
        assert_eq!(style.size.width, Dimension::from_length(200.0));
        assert_eq!(style.size.height, Dimension::from_length(100.0));
    }

    #[test]
    fn window_margins_do_not_affect_layout() {
        let mut data = WidgetData::window("w", PxSize::new(10, 10), Layer::Background, vec![]);
        data.margins.set(Edge::Top, 40);
        assert_eq!(widget_style(&data).margin, <Style>::default().margin);
    }

    #[test]
    fn container_orientation_and_gap() {
        let data = WidgetData::container(Orientation::Horizontal, 5);
        let style = widget_style(&data);
        assert_eq!(style.flex_direction, FlexDirection::Row);
        assert_eq!(style.gap.width, LengthPercentage::from_length(5.0));
    }

    #[test]
    fn margins_stack_with_style_margin() {
        let mut data = WidgetData::container(Orientation::Vertical, 0);
        data.margins.set(Edge::Left, 3);
        data.style.set("margin-left", PropertyValue::Length(2));
        assert_eq!(widget_style(&data).margin.left, LengthPercentageAuto::from_length(5.0));
    }

    #[test]
    fn label_size_follows_resolved_font_size() {
        let mut data = WidgetData::label("ab", 10);
        data.style.set("font-size", PropertyValue::Length(20));
        data.style.set("padding-left", PropertyValue::Length(4));
        let style = widget_style(&data);
        assert_eq!(style.size.width, Dimension::from_length(24.0 + 4.0));
        assert_eq!(style.size.height, Dimension::from_length(25.0));
        assert_eq!(style.flex_shrink, 0.0);
    }
}
