//! ResolvedStyle: the final, render-ready property set of one widget.
//!
//! Keys are property names. A property that is absent was never set by any
//! cascade layer; renderers apply their own fallback.

use std::collections::BTreeMap;

use crate::css::color::Color;
use crate::css::properties::PropertyValue;
use crate::geometry::Spacing;

/// Properties a widget takes from its parent before any other layer applies.
pub const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-align",
];

/// Ordered property map produced by the cascade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyle {
    values: BTreeMap<String, PropertyValue>,
}

impl ResolvedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a style with the inheritable subset of `parent`.
    pub fn inherited_from(parent: &ResolvedStyle) -> Self {
        let values = INHERITED_PROPERTIES
            .iter()
            .filter_map(|&name| parent.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();
        Self { values }
    }

    pub fn get(&self, property: &str) -> Option<&PropertyValue> {
        self.values.get(property)
    }

    /// Set a property, replacing any earlier layer's value.
    pub fn set(&mut self, property: impl Into<String>, value: PropertyValue) {
        self.values.insert(property.into(), value);
    }

    pub fn color(&self, property: &str) -> Option<Color> {
        self.get(property).and_then(PropertyValue::as_color)
    }

    pub fn length(&self, property: &str) -> Option<u32> {
        self.get(property).and_then(PropertyValue::as_length)
    }

    /// `padding-*` lengths, missing edges as zero.
    pub fn padding(&self) -> Spacing {
        self.edges("padding")
    }

    /// `margin-*` lengths, missing edges as zero.
    pub fn margin(&self) -> Spacing {
        self.edges("margin")
    }

    fn edges(&self, prefix: &str) -> Spacing {
        let edge = |side: &str| self.length(&format!("{prefix}-{side}")).unwrap_or(0);
        Spacing::new(edge("top"), edge("right"), edge("bottom"), edge("left"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
