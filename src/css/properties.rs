//! Property typing: declaration tokens → typed [`PropertyValue`]s.
//!
//! Known properties are validated and normalized here, once, when a block is
//! attached. Unknown properties pass through opaquely as [`PropertyValue::Raw`].

use std::fmt;

use crate::css::color::Color;
use crate::css::model::{Declaration, DeclarationValue};
use crate::geometry::MAX_PX;

/// A typed, render-ready property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Color(Color),
    /// Whole pixels.
    Length(u32),
    Number(f32),
    Keyword(String),
    Text(String),
    /// An unrecognized property's value text, verbatim.
    Raw(String),
}

impl PropertyValue {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_length(&self) -> Option<u32> {
        match self {
            PropertyValue::Length(px) => Some(*px),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Keyword(s) | PropertyValue::Text(s) | PropertyValue::Raw(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Color(c) => write!(f, "{c}"),
            PropertyValue::Length(px) => write!(f, "{px}px"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Keyword(s) | PropertyValue::Raw(s) => f.write_str(s),
            PropertyValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Errors from property typing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("invalid value for {property}: {message}")]
    InvalidValue { property: String, message: String },
}

fn invalid(property: &str, message: impl Into<String>) -> PropertyError {
    PropertyError::InvalidValue { property: property.into(), message: message.into() }
}

const COLOR_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "border-color",
    "outline-color",
    "caret-color",
];

const LENGTH_PROPERTIES: &[&str] = &[
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    "border-width",
    "border-radius",
    "min-width",
    "min-height",
    "spacing",
];

/// Type one declaration into its (property, value) entries.
///
/// Shorthands expand into several entries; everything else yields one.
pub fn compile_declaration(decl: &Declaration) -> Result<Vec<(String, PropertyValue)>, PropertyError> {
    let property = decl.property.as_str();
    let values = decl.values.as_slice();
    let single = |value: PropertyValue| -> Result<Vec<(String, PropertyValue)>, PropertyError> {
        Ok(vec![(property.to_string(), value)])
    };

    match property {
        p if COLOR_PROPERTIES.contains(&p) => single(PropertyValue::Color(require_color(values, p)?)),
        "background" => {
            let color = require_color(values, property)?;
            Ok(vec![("background-color".to_string(), PropertyValue::Color(color))])
        }
        "font-size" => {
            let px = require_single_length(values, property)?;
            if px == 0 {
                return Err(invalid(property, "font size must be positive"));
            }
            single(PropertyValue::Length(px))
        }
        p if LENGTH_PROPERTIES.contains(&p) => single(PropertyValue::Length(require_single_length(values, p)?)),
        "padding" | "margin" => {
            let [top, right, bottom, left] = parse_length_box(values, property)?;
            Ok(vec![
                (format!("{property}-top"), PropertyValue::Length(top)),
                (format!("{property}-right"), PropertyValue::Length(right)),
                (format!("{property}-bottom"), PropertyValue::Length(bottom)),
                (format!("{property}-left"), PropertyValue::Length(left)),
            ])
        }
        "opacity" => match values {
            [DeclarationValue::Number(n)] if (0.0..=1.0).contains(n) => single(PropertyValue::Number(*n)),
            [DeclarationValue::Number(n)] => Err(invalid(property, format!("{n} outside 0..=1"))),
            _ => Err(invalid(property, "expected a number between 0 and 1")),
        },
        "font-weight" => match values {
            [DeclarationValue::Number(n)] if (100.0..=900.0).contains(n) && n % 100.0 == 0.0 => {
                single(PropertyValue::Keyword(format!("{n}")))
            }
            _ => {
                let kw = require_keyword(values, property, &["normal", "bold", "lighter", "bolder"])?;
                single(PropertyValue::Keyword(kw))
            }
        },
        "font-style" => {
            single(PropertyValue::Keyword(require_keyword(values, property, &["normal", "italic", "oblique"])?))
        }
        "text-align" => {
            single(PropertyValue::Keyword(require_keyword(values, property, &["left", "center", "right"])?))
        }
        "font-family" => single(PropertyValue::Text(decl.raw.clone())),
        _ => single(PropertyValue::Raw(decl.raw.clone())),
    }
}

/// Parse one length: `Npx` or a bare number, non-negative, rounded to whole pixels.
pub fn parse_length(value: &DeclarationValue, property: &str) -> Result<u32, PropertyError> {
    let n = match value {
        DeclarationValue::Number(n) => *n,
        DeclarationValue::Dimension(n, unit) if unit == "px" => *n,
        DeclarationValue::Dimension(_, unit) => {
            return Err(invalid(property, format!("unsupported unit `{unit}`; use px")));
        }
        other => return Err(invalid(property, format!("expected a length, got {other:?}"))),
    };
    if n < 0.0 {
        return Err(invalid(property, "length must not be negative"));
    }
    let px = n.round();
    if px > MAX_PX as f32 {
        return Err(invalid(property, format!("length must be at most {MAX_PX}px")));
    }
    Ok(px as u32)
}

fn require_single_length(values: &[DeclarationValue], property: &str) -> Result<u32, PropertyError> {
    match values {
        [value] => parse_length(value, property),
        _ => Err(invalid(property, format!("expected 1 value, got {}", values.len()))),
    }
}

/// Parse 1-4 lengths into `[top, right, bottom, left]`.
///
/// - 1 value: all sides
/// - 2 values: vertical, horizontal
/// - 3 values: top, horizontal, bottom
/// - 4 values: top, right, bottom, left
pub fn parse_length_box(values: &[DeclarationValue], property: &str) -> Result<[u32; 4], PropertyError> {
    let px = values
        .iter()
        .map(|v| parse_length(v, property))
        .collect::<Result<Vec<_>, _>>()?;
    match px.as_slice() {
        [all] => Ok([*all; 4]),
        [v, h] => Ok([*v, *h, *v, *h]),
        [t, h, b] => Ok([*t, *h, *b, *h]),
        [t, r, b, l] => Ok([*t, *r, *b, *l]),
        _ => Err(invalid(property, format!("expected 1-4 values, got {}", px.len()))),
    }
}

/// Parse a color from a single hex, named, `rgb()` or `rgba()` value.
fn require_color(values: &[DeclarationValue], property: &str) -> Result<Color, PropertyError> {
    let value = match values {
        [value] => value,
        _ => return Err(invalid(property, format!("expected 1 color value, got {}", values.len()))),
    };
    match value {
        DeclarationValue::Color(hex) => {
            Color::from_hex(hex).ok_or_else(|| invalid(property, format!("invalid hex color `#{hex}`")))
        }
        DeclarationValue::Ident(name) => {
            Color::named(name).ok_or_else(|| invalid(property, format!("unknown color `{name}`")))
        }
        DeclarationValue::Function { name, args } if name == "rgb" || name == "rgba" => {
            let nums = args
                .iter()
                .map(|a| match a {
                    DeclarationValue::Number(n) => Ok(*n),
                    other => Err(invalid(property, format!("expected a number in {name}(), got {other:?}"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let channels = match nums.as_slice() {
                [r, g, b] => Color::from_channels(*r, *g, *b, None),
                [r, g, b, a] => Color::from_channels(*r, *g, *b, Some(*a)),
                _ => return Err(invalid(property, format!("{name}() takes 3 or 4 arguments"))),
            };
            channels.map_err(|message| invalid(property, message))
        }
        other => Err(invalid(property, format!("expected a color, got {other:?}"))),
    }
}

fn require_keyword(values: &[DeclarationValue], property: &str, allowed: &[&str]) -> Result<String, PropertyError> {
    match values {
        [DeclarationValue::Ident(name)] => {
            let lower = name.to_ascii_lowercase();
            if allowed.contains(&lower.as_str()) {
                Ok(lower)
            } else {
                Err(invalid(property, format!("expected {}, got `{name}`", allowed.join("|"))))
            }
        }
        _ => Err(invalid(property, format!("expected one of {}", allowed.join("|")))),
    }
}
