//! Style rule AST: Selector, Declaration, RuleSet, StyleSheet.

use crate::dom::WidgetKind;

/// A selector in the supported vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`: every widget.
    Universal,
    /// A widget type name (`window`, `box`, `label`), lowercased.
    ///
    /// Unknown names are kept so the rule parses, but they match nothing.
    Kind(String),
    /// A bare declaration list: the widget the block is attached to.
    Own,
}

impl Selector {
    /// Whether this selector applies to a widget of `kind`.
    ///
    /// `is_owner` is true when the block being applied is attached to the
    /// widget itself, the only case where [`Selector::Own`] matches.
    pub fn matches(&self, kind: WidgetKind, is_owner: bool) -> bool {
        match self {
            Selector::Universal => true,
            Selector::Kind(name) => kind.type_name() == name,
            Selector::Own => is_owner,
        }
    }
}

/// A value token within a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationValue {
    /// An identifier like `red`, `bold`, `center`.
    Ident(String),
    /// A bare number like `10` or `0.5`.
    Number(f32),
    /// A number with a unit suffix like `18px` or `50%`.
    Dimension(f32, String),
    /// A hex color (without the `#` prefix), e.g. `"1e1e2e"`.
    Color(String),
    /// A quoted string value, quotes removed.
    String(String),
    /// A function call such as `rgb(255, 0, 0)`; commas are not kept in `args`.
    Function { name: String, args: Vec<DeclarationValue> },
    /// A top-level comma, as in `font-family: "A", sans-serif`.
    Comma,
}

/// A single property declaration, e.g. `color: red` or `padding: 4px 8px`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Lowercased property name.
    pub property: String,
    pub values: Vec<DeclarationValue>,
    /// The value text exactly as written, for opaque properties.
    pub raw: String,
    /// 1-based source line of the property name.
    pub line: usize,
}

/// Selectors plus the declarations they apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// A parsed style block: its rules in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    pub rules: Vec<RuleSet>,
}

impl StyleSheet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
