//! RGBA color normalization.
//!
//! Every color form the style engine accepts (`#rgb`, `#rgba`, `#rrggbb`,
//! `#rrggbbaa`, `rgb()`, `rgba()`, named colors, `transparent`) resolves to
//! one [`Color`] so renderers never re-parse text.

use std::fmt;

/// An sRGB color with straight alpha in `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse hex digits without the leading `#`: 3, 4, 6, or 8 digits.
    pub fn from_hex(hex: &str) -> Option<Color> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        match hex.len() {
            3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, f32::from(nibble(3)?) / 255.0)),
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, f32::from(byte(6)?) / 255.0)),
            _ => None,
        }
    }

    /// Look up a named color (case-insensitive).
    pub fn named(name: &str) -> Option<Color> {
        let color = match name.to_ascii_lowercase().as_str() {
            "transparent" => Color::TRANSPARENT,
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "lime" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "cyan" | "aqua" => Color::rgb(0, 255, 255),
            "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "pink" => Color::rgb(255, 192, 203),
            "brown" => Color::rgb(165, 42, 42),
            "navy" => Color::rgb(0, 0, 128),
            "teal" => Color::rgb(0, 128, 128),
            "olive" => Color::rgb(128, 128, 0),
            "maroon" => Color::rgb(128, 0, 0),
            "silver" => Color::rgb(192, 192, 192),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "darkgray" | "darkgrey" => Color::rgb(169, 169, 169),
            "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
            _ => return None,
        };
        Some(color)
    }

    /// Build from `rgb()`/`rgba()` channel values.
    ///
    /// Channels are 0..=255, alpha is 0..=1. Out-of-range values are rejected
    /// rather than clamped.
    pub fn from_channels(r: f32, g: f32, b: f32, a: Option<f32>) -> Result<Color, String> {
        let channel = |v: f32| {
            if (0.0..=255.0).contains(&v) {
                Ok(v.round() as u8)
            } else {
                Err(format!("channel {v} outside 0..=255"))
            }
        };
        let alpha = a.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&alpha) {
            return Err(format!("alpha {alpha} outside 0..=1"));
        }
        Ok(Color::rgba(channel(r)?, channel(g)?, channel(b)?, alpha))
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

impl fmt::Display for Color {
    /// `#rrggbb` when opaque, `rgba(r, g, b, a)` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}
