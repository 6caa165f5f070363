//! logos-based tokenizer for widget style rules.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `#fff` as HexColor beats `#` as Delim)
//! 2. For equal length matches, earlier-defined variants win
//!
//! Our ordering ensures:
//! - `#ff00aa` matches [`Token::HexColor`], not `Delim` + `Ident`
//! - `18px` matches [`Token::Dimension`], not `Number` + `Ident`
//! - `rgba(` matches [`Token::Function`], not `Ident` + `ParenOpen`
//!
//! Selector syntax the engine does not support (`.class`, `#id`, `>`, ...)
//! still lexes, as [`Token::Delim`], so the parser can reject the rule with a
//! warning instead of misreading it.

use logos::Logos;

/// Style token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Compound tokens (longer matches, defined first) ──────────────

    /// `!important` flag.
    #[token("!important")]
    Important,

    /// Hex color: `#fff`, `#ff00aa`, `#ff00aa80`.
    #[regex(r"#[0-9a-fA-F]{3,8}")]
    HexColor,

    /// Number with a unit suffix: `18px`, `50%`, `1.5em`.
    #[regex(r"-?[0-9]+(\.[0-9]+)?([a-zA-Z]+|%)")]
    Dimension,

    /// Function opener including its parenthesis: `rgb(`, `rgba(`.
    #[regex(r"-?[a-zA-Z_][a-zA-Z0-9_-]*\(")]
    Function,

    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Number: integer or float, possibly negative.
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    /// Identifier: property names, type selectors, keywords, color names.
    #[regex(r"-?[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    // ── Single-character punctuation ─────────────────────────────────

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    /// `*`
    #[token("*")]
    Star,

    /// Any other single symbol. Never valid in a rule, but kept so the
    /// parser sees it.
    #[regex(r"[.#>+~!/=@&|^$%\[\]]")]
    Delim,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<(Token, String)> {
        Token::lexer(input)
            .spanned()
            .map(|(result, span)| (result.unwrap_or(Token::Delim), input[span].to_string()))
            .collect()
    }

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    // ── Punctuation ──────────────────────────────────────────────────

    #[test]
    fn punctuation() {
        assert_eq!(
            tokens("{ } ( ) : ; , *"),
            vec![
                Token::BraceOpen,
                Token::BraceClose,
                Token::ParenOpen,
                Token::ParenClose,
                Token::Colon,
                Token::Semicolon,
                Token::Comma,
                Token::Star,
            ]
        );
    }

    #[test]
    fn unsupported_symbols_are_delims() {
        assert_eq!(
            tokens(". > + ~ #"),
            vec![Token::Delim, Token::Delim, Token::Delim, Token::Delim, Token::Delim]
        );
    }

    #[test]
    fn unlexable_characters_become_delims() {
        assert_eq!(tokens("?"), vec![Token::Delim]);
    }

    // ── Values ───────────────────────────────────────────────────────

    #[test]
    fn dimension_beats_number() {
        assert_eq!(
            tokenize("18px"),
            vec![(Token::Dimension, "18px".to_string())]
        );
        assert_eq!(tokens("1.5em"), vec![Token::Dimension]);
        assert_eq!(tokens("50%"), vec![Token::Dimension]);
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(tokens("5 -3 0.5"), vec![Token::Number, Token::Number, Token::Number]);
    }

    #[test]
    fn hex_color_beats_delim() {
        assert_eq!(
            tokenize("#1e1e2e"),
            vec![(Token::HexColor, "#1e1e2e".to_string())]
        );
    }

    #[test]
    fn function_opener() {
        assert_eq!(
            tokens("rgba(0, 0, 0, 0.5)"),
            vec![
                Token::Function,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            tokens(r#""JetBrains Mono" 'Noto Sans'"#),
            vec![Token::StringLiteral, Token::StringLiteralSingle]
        );
    }

    #[test]
    fn important_flag() {
        assert_eq!(tokens("red !important"), vec![Token::Ident, Token::Important]);
    }

    // ── Rules ────────────────────────────────────────────────────────

    #[test]
    fn full_rule() {
        assert_eq!(
            tokens("label { font-size: 18px; color: white; }"),
            vec![
                Token::Ident,
                Token::BraceOpen,
                Token::Ident,
                Token::Colon,
                Token::Dimension,
                Token::Semicolon,
                Token::Ident,
                Token::Colon,
                Token::Ident,
                Token::Semicolon,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn hyphenated_identifiers() {
        assert_eq!(
            tokenize("background-color"),
            vec![(Token::Ident, "background-color".to_string())]
        );
        assert_eq!(tokens("-webkit-thing"), vec![Token::Ident]);
    }

    #[test]
    fn pseudo_class_lexes_as_colon_ident() {
        assert_eq!(tokens("label:hover"), vec![Token::Ident, Token::Colon, Token::Ident]);
    }
}
