//! Cascade resolution: compile attached style blocks and resolve one widget.
//!
//! A widget's [`ResolvedStyle`] is built in four layers, each overriding the
//! previous one:
//!
//! 0. inheritable properties copied from the parent's resolved style
//! 1. built-in defaults for the widget kind
//! 2. matching rules from blocks attached to ancestors, root to leaf
//! 3. matching rules from the widget's own block
//!
//! Within one block, rules apply in [`Specificity`] order.

use crate::css::color::Color;
use crate::css::model::Selector;
use crate::css::parser::{parse_css, StyleParseWarning};
use crate::css::properties::{compile_declaration, PropertyError, PropertyValue};
use crate::css::specificity::Specificity;
use crate::css::styles::ResolvedStyle;
use crate::dom::WidgetKind;

/// A parsed and typed style block ready for matching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone, PartialEq)]
struct CompiledRule {
    selectors: Vec<Selector>,
    source_order: u32,
    declarations: Vec<(String, PropertyValue)>,
}

impl CompiledRules {
    /// Parse and type `source`. Declarations with invalid values are dropped
    /// and reported alongside the parse warnings.
    pub fn compile(source: &str) -> (Self, Vec<StyleParseWarning>) {
        let (sheet, mut warnings) = parse_css(source);
        let mut rules = Vec::with_capacity(sheet.rules.len());

        for (i, rule) in sheet.rules.into_iter().enumerate() {
            let mut declarations = Vec::new();
            for decl in &rule.declarations {
                match compile_declaration(decl) {
                    Ok(entries) => declarations.extend(entries),
                    Err(PropertyError::InvalidValue { property, message }) => {
                        warnings.push(StyleParseWarning::for_property(decl.line, property, message));
                    }
                }
            }
            rules.push(CompiledRule {
                selectors: rule.selectors,
                source_order: i as u32,
                declarations,
            });
        }

        (CompiledRules { rules }, warnings)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply this block's matching rules onto `style`.
    ///
    /// `is_owner` is true when the block is attached to the widget itself.
    /// A rule listing several selectors counts at its highest matching rank.
    pub fn apply(&self, kind: WidgetKind, is_owner: bool, style: &mut ResolvedStyle) {
        let mut matches: Vec<(Specificity, &[(String, PropertyValue)])> = self
            .rules
            .iter()
            .filter_map(|rule| {
                rule.selectors
                    .iter()
                    .filter(|sel| sel.matches(kind, is_owner))
                    .map(|sel| Specificity::from_selector(sel, rule.source_order))
                    .max()
                    .map(|spec| (spec, rule.declarations.as_slice()))
            })
            .collect();

        matches.sort_by_key(|(spec, _)| *spec);

        for (_, declarations) in matches {
            for (name, value) in declarations {
                style.set(name.clone(), value.clone());
            }
        }
    }
}

/// The rule text attached to one widget, kept verbatim with its compiled form.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    source: String,
    compiled: CompiledRules,
}

impl StyleRule {
    pub fn parse(source: impl Into<String>) -> (Self, Vec<StyleParseWarning>) {
        let source = source.into();
        let (compiled, warnings) = CompiledRules::compile(&source);
        (Self { source, compiled }, warnings)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &CompiledRules {
        &self.compiled
    }
}

/// Built-in defaults for a widget kind.
///
/// Windows are transparent; labels are white at the size they were created
/// with.
pub fn kind_defaults(kind: WidgetKind, label_font_size: Option<u32>) -> Vec<(&'static str, PropertyValue)> {
    match kind {
        WidgetKind::Window => vec![("background-color", PropertyValue::Color(Color::TRANSPARENT))],
        WidgetKind::Container => Vec::new(),
        WidgetKind::Label => {
            let mut defaults = vec![("color", PropertyValue::Color(Color::WHITE))];
            if let Some(px) = label_font_size {
                defaults.push(("font-size", PropertyValue::Length(px)));
            }
            defaults
        }
    }
}

/// Everything needed to resolve one widget's style.
#[derive(Debug, Clone, Copy)]
pub struct CascadeInput<'a> {
    pub kind: WidgetKind,
    pub label_font_size: Option<u32>,
    pub parent: Option<&'a ResolvedStyle>,
    /// Blocks attached to ancestors, outermost first.
    pub ancestors: &'a [&'a CompiledRules],
    pub own: Option<&'a CompiledRules>,
}

/// Resolve one widget's style from its cascade layers.
pub fn resolve(input: CascadeInput<'_>) -> ResolvedStyle {
    let mut style = input
        .parent
        .map(ResolvedStyle::inherited_from)
        .unwrap_or_default();

    for (name, value) in kind_defaults(input.kind, input.label_font_size) {
        style.set(name, value);
    }

    for block in input.ancestors {
        block.apply(input.kind, false, &mut style);
    }

    if let Some(own) = input.own {
        own.apply(input.kind, true, &mut style);
    }

    style
}
