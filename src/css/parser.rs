//! Fault-tolerant recursive descent parser for style blocks.
//!
//! Parses rule text into a [`StyleSheet`]. Parsing never fails as a whole:
//! problems are collected as [`StyleParseWarning`]s and the parser resumes at
//! the next declaration (or, for a bad selector, after the offending rule).
//!
//! Accepted forms:
//! - `label { color: white; }`, `box, label { ... }`, `* { ... }`
//! - a bare declaration list `color: red; font-size: 12px`, which targets the
//!   widget the block is attached to

use std::fmt;

use logos::Logos;

use crate::css::model::*;
use crate::css::tokenizer::Token;
use crate::dom::WidgetKind;

/// A recoverable problem found while parsing or compiling a style block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleParseWarning {
    /// 1-based line in the rule text.
    pub line: usize,
    /// The declaration's property, when the problem is inside one.
    pub property: Option<String>,
    pub message: String,
}

impl StyleParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, property: None, message: message.into() }
    }

    pub fn for_property(line: usize, property: impl Into<String>, message: impl Into<String>) -> Self {
        Self { line, property: Some(property.into()), message: message.into() }
    }
}

impl fmt::Display for StyleParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "line {}: {}: {}", self.line, property, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

/// A positioned token.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    byte_start: usize,
    byte_end: usize,
    line: usize,
}

/// Blank out `/* ... */` comments, keeping byte offsets and newlines intact
/// so token positions still map to source lines.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_comment = false;
    let mut chars = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !in_comment && c == '/' && chars.peek().is_some_and(|&(_, n)| n == '*') {
            chars.next();
            result.push_str("  ");
            in_comment = true;
        } else if in_comment && c == '*' && chars.peek().is_some_and(|&(_, n)| n == '/') {
            chars.next();
            result.push_str("  ");
            in_comment = false;
        } else if in_comment && c != '\n' {
            for _ in 0..c.len_utf8() {
                result.push(' ');
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Byte offsets at which each line starts.
fn line_starts(input: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(input.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn tokenize_with_spans(input: &str) -> Vec<PToken> {
    let starts = line_starts(input);
    Token::lexer(input)
        .spanned()
        .map(|(result, span)| PToken {
            token: result.unwrap_or(Token::Delim),
            text: input[span.clone()].to_string(),
            byte_start: span.start,
            byte_end: span.end,
            line: starts.partition_point(|&s| s <= span.start),
        })
        .collect()
}

/// Parse rule text into a [`StyleSheet`] plus the warnings found on the way.
pub fn parse_css(input: &str) -> (StyleSheet, Vec<StyleParseWarning>) {
    let cleaned = strip_comments(input);
    let mut parser = Parser {
        source: &cleaned,
        tokens: tokenize_with_spans(&cleaned),
        cursor: 0,
        warnings: Vec::new(),
    };
    let sheet = parser.parse_sheet();
    (sheet, parser.warnings)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<PToken>,
    cursor: usize,
    warnings: Vec<StyleParseWarning>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn warn(&mut self, warning: StyleParseWarning) {
        self.warnings.push(warning);
    }

    fn parse_sheet(&mut self) -> StyleSheet {
        let mut rules = Vec::new();
        let mut bare = Vec::new();

        while let Some(tok) = self.peek() {
            match tok.token {
                Token::Semicolon => {
                    self.advance();
                }
                Token::BraceClose => {
                    let line = tok.line;
                    self.advance();
                    self.warn(StyleParseWarning::new(line, "unexpected `}`"));
                }
                _ if self.starts_rule() => {
                    flush_bare(&mut rules, &mut bare);
                    if let Some(rule) = self.parse_rule() {
                        rules.push(rule);
                    }
                }
                _ => {
                    if let Some(decl) = self.parse_declaration() {
                        bare.push(decl);
                    }
                }
            }
        }
        flush_bare(&mut rules, &mut bare);

        StyleSheet { rules }
    }

    /// True if a `{` comes before the next `;` or `}`.
    fn starts_rule(&self) -> bool {
        self.tokens[self.cursor..]
            .iter()
            .find(|t| matches!(t.token, Token::BraceOpen | Token::Semicolon | Token::BraceClose))
            .is_some_and(|t| t.token == Token::BraceOpen)
    }

    fn parse_rule(&mut self) -> Option<RuleSet> {
        let line = self.current_line();
        match self.parse_selector_list() {
            Ok(selectors) => {
                self.advance(); // `{`
                let declarations = self.parse_block_body(line);
                Some(RuleSet { selectors, declarations })
            }
            Err(message) => {
                self.warn(StyleParseWarning::new(line, format!("{message}; rule skipped")));
                self.skip_rule();
                None
            }
        }
    }

    /// Comma-separated selectors, stopping at (not consuming) the `{`.
    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, String> {
        let mut selectors = vec![self.parse_selector()?];
        loop {
            match self.peek() {
                Some(t) if t.token == Token::Comma => {
                    self.advance();
                    selectors.push(self.parse_selector()?);
                }
                Some(t) if t.token == Token::BraceOpen => return Ok(selectors),
                Some(t) => return Err(format!("unsupported selector syntax near `{}`", t.text)),
                None => return Err("unexpected end of input in selector".into()),
            }
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, String> {
        let tok = self
            .advance()
            .ok_or_else(|| String::from("unexpected end of input in selector"))?;
        match tok.token {
            Token::Star => Ok(Selector::Universal),
            Token::Ident => {
                let name = tok.text.to_ascii_lowercase();
                if WidgetKind::from_type_name(&name).is_none() {
                    self.warn(StyleParseWarning::new(
                        tok.line,
                        format!("unknown widget type `{}`; selector matches nothing", tok.text),
                    ));
                }
                Ok(Selector::Kind(name))
            }
            _ => Err(format!("unsupported selector syntax near `{}`", tok.text)),
        }
    }

    /// Skip a rejected rule: everything through its matching `}`.
    fn skip_rule(&mut self) {
        while let Some(tok) = self.advance() {
            if tok.token == Token::BraceOpen {
                self.skip_nested_block();
                return;
            }
        }
    }

    /// Skip to the `}` closing a block whose `{` was already consumed.
    fn skip_nested_block(&mut self) {
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::BraceOpen => depth += 1,
                Token::BraceClose => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Declarations up to and including the closing `}`.
    fn parse_block_body(&mut self, open_line: usize) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.peek_token() {
                None => {
                    self.warn(StyleParseWarning::new(
                        open_line,
                        "unterminated block; keeping declarations read so far",
                    ));
                    break;
                }
                Some(Token::BraceClose) => {
                    self.advance();
                    break;
                }
                Some(Token::Semicolon) => {
                    self.advance();
                }
                Some(_) => {
                    if let Some(decl) = self.parse_declaration() {
                        declarations.push(decl);
                    }
                }
            }
        }
        declarations
    }

    /// Skip past the rest of a broken declaration: through the next `;` or
    /// nested block, or up to (not past) the enclosing `}`.
    fn recover(&mut self) {
        while let Some(tok) = self.peek() {
            match tok.token {
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::BraceClose => return,
                Token::BraceOpen => {
                    self.advance();
                    self.skip_nested_block();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// `property: value...;`
    fn parse_declaration(&mut self) -> Option<Declaration> {
        let tok = self.peek()?.clone();
        if tok.token != Token::Ident {
            self.warn(StyleParseWarning::new(
                tok.line,
                format!("expected property name, found `{}`", tok.text),
            ));
            self.recover();
            return None;
        }
        self.advance();
        let property = tok.text.to_ascii_lowercase();
        let line = tok.line;

        if self.peek_token() != Some(Token::Colon) {
            self.warn(StyleParseWarning::for_property(line, &property, "expected `:` after property name"));
            self.recover();
            return None;
        }
        self.advance();

        let (values, raw) = match self.parse_values(&property, line) {
            Ok(parsed) => parsed,
            Err(message) => {
                self.warn(StyleParseWarning::for_property(line, &property, message));
                self.recover();
                return None;
            }
        };

        if self.peek_token() == Some(Token::Semicolon) {
            self.advance();
        }

        if values.is_empty() {
            self.warn(StyleParseWarning::for_property(line, &property, "missing value"));
            return None;
        }

        Some(Declaration { property, values, raw, line })
    }

    /// Values up to the terminating `;` or `}`, plus their source text.
    fn parse_values(&mut self, property: &str, line: usize) -> Result<(Vec<DeclarationValue>, String), String> {
        let mut values = Vec::new();
        let mut span: Option<(usize, usize)> = None;

        while let Some(tok) = self.peek() {
            match tok.token {
                Token::Semicolon | Token::BraceClose => break,
                Token::Important => {
                    self.advance();
                    self.warn(StyleParseWarning::for_property(
                        line,
                        property,
                        "`!important` is not supported and was ignored",
                    ));
                }
                _ => {
                    let start = tok.byte_start;
                    values.push(self.parse_value()?);
                    let end = self.tokens[self.cursor - 1].byte_end;
                    span = Some((span.map_or(start, |(s, _)| s), end));
                }
            }
        }

        let raw = span
            .map(|(start, end)| self.source[start..end].trim().to_string())
            .unwrap_or_default();
        Ok((values, raw))
    }

    fn parse_value(&mut self) -> Result<DeclarationValue, String> {
        let tok = self
            .advance()
            .ok_or_else(|| String::from("unexpected end of input in value"))?;

        match tok.token {
            Token::Number => tok
                .text
                .parse()
                .map(DeclarationValue::Number)
                .map_err(|_| format!("invalid number `{}`", tok.text)),
            Token::Dimension => {
                let (num, unit) =
                    split_dimension(&tok.text).ok_or_else(|| format!("invalid dimension `{}`", tok.text))?;
                let n: f32 = num
                    .parse()
                    .map_err(|_| format!("invalid number in dimension `{}`", tok.text))?;
                Ok(DeclarationValue::Dimension(n, unit.to_ascii_lowercase()))
            }
            Token::Ident => Ok(DeclarationValue::Ident(tok.text)),
            Token::HexColor => Ok(DeclarationValue::Color(tok.text[1..].to_string())),
            Token::StringLiteral | Token::StringLiteralSingle => {
                Ok(DeclarationValue::String(tok.text[1..tok.text.len() - 1].to_string()))
            }
            Token::Comma => Ok(DeclarationValue::Comma),
            Token::Function => {
                let name = tok.text[..tok.text.len() - 1].to_ascii_lowercase();
                let args = self.parse_function_args(&name)?;
                Ok(DeclarationValue::Function { name, args })
            }
            _ => Err(format!("unexpected `{}` in value", tok.text)),
        }
    }

    /// Arguments after `name(` through the closing `)`. Commas are separators.
    fn parse_function_args(&mut self, name: &str) -> Result<Vec<DeclarationValue>, String> {
        let mut args = Vec::new();
        loop {
            match self.peek_token() {
                Some(Token::ParenClose) => {
                    self.advance();
                    return Ok(args);
                }
                Some(Token::Comma) => {
                    self.advance();
                }
                None | Some(Token::Semicolon) | Some(Token::BraceClose) => {
                    return Err(format!("unterminated `{name}(`"));
                }
                Some(_) => args.push(self.parse_value()?),
            }
        }
    }
}

fn flush_bare(rules: &mut Vec<RuleSet>, bare: &mut Vec<Declaration>) {
    if !bare.is_empty() {
        rules.push(RuleSet {
            selectors: vec![Selector::Own],
            declarations: std::mem::take(bare),
        });
    }
}

/// Split a dimension string like `18px` or `50%` into (number, unit).
fn split_dimension(s: &str) -> Option<(&str, &str)> {
    let unit_start = s
        .char_indices()
        .find(|(i, c)| !c.is_ascii_digit() && *c != '.' && !(*c == '-' && *i == 0))
        .map(|(i, _)| i)?;

    if unit_start == 0 || unit_start >= s.len() {
        return None;
    }

    Some((&s[..unit_start], &s[unit_start..]))
}
