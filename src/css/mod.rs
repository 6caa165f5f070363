//! Style engine: tokenizer, parser, typed properties, specificity, cascade.

pub mod tokenizer;
pub mod model;
pub mod parser;
pub mod color;
pub mod properties;
pub mod styles;
pub mod specificity;
pub mod cascade;

pub use cascade::{CompiledRules, StyleRule};
pub use color::Color;
pub use parser::StyleParseWarning;
pub use properties::PropertyValue;
pub use styles::ResolvedStyle;
