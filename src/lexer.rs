use std::fmt;

use crate::diagnostics::{Diagnostic, Position, Span};

/// Identifiers spelled like one of these are reclassified as keywords.
pub const KEYWORDS: [&str; 3] = ["data", "null", "import"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Identifier,
    Keyword,
    Operator,
    Bracket,
    Separator,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_any(&self, kind: TokenKind, texts: &[&str]) -> bool {
        self.kind == kind && texts.contains(&self.text.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' at {}", self.kind, self.text, self.span.begin)
    }
}

/// Returns the byte length of the match anchored at the start of the input.
type Scanner = fn(&str) -> Option<usize>;

/// Tried in order; the first pattern that matches wins. `None` discards the
/// matched text.
const PATTERNS: [(Scanner, Option<TokenKind>); 7] = [
    (scan_whitespace, None),
    (scan_string, Some(TokenKind::String)),
    (scan_number, Some(TokenKind::Number)),
    (scan_operator, Some(TokenKind::Operator)),
    (scan_identifier, Some(TokenKind::Identifier)),
    (scan_bracket, Some(TokenKind::Bracket)),
    (scan_separator, Some(TokenKind::Separator)),
];

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    position: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            position: Position::default(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    /// Runs the first matching pattern and advances past its text.
    fn step(&mut self) -> Result<Option<Token>, Diagnostic> {
        let rest = self.rest();
        for (scan, kind) in PATTERNS {
            let Some(length) = scan(rest).filter(|length| *length > 0) else {
                continue;
            };
            let text = &rest[..length];
            let begin = self.position;
            self.position = text.chars().fold(begin, Position::advance);
            self.offset += length;
            return Ok(kind.map(|kind| Token {
                kind: reclassify(kind, text),
                text: text.to_string(),
                span: Span::new(begin, self.position),
            }));
        }
        Err(self.unmatched(rest))
    }

    fn unmatched(&self, rest: &str) -> Diagnostic {
        let ch = rest.chars().next().unwrap_or_default();
        let diagnostic = Diagnostic::lex(format!("unidentified character '{ch}'"))
            .with_span(Span::new(self.position, self.position.advance(ch)));
        if ch == '"' {
            diagnostic.with_note("string literal is never closed")
        } else {
            diagnostic
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        while !self.rest().is_empty() {
            if let Some(token) = self.step()? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).tokenize()
}

fn reclassify(kind: TokenKind, text: &str) -> TokenKind {
    if kind == TokenKind::Identifier && KEYWORDS.contains(&text) {
        TokenKind::Keyword
    } else {
        kind
    }
}

fn scan_while(input: &str, predicate: impl Fn(char) -> bool) -> usize {
    input
        .char_indices()
        .find(|(_, ch)| !predicate(*ch))
        .map_or(input.len(), |(idx, _)| idx)
}

fn scan_whitespace(input: &str) -> Option<usize> {
    Some(scan_while(input, char::is_whitespace))
}

fn scan_string(input: &str) -> Option<usize> {
    let mut chars = input.char_indices();
    if !matches!(chars.next(), Some((_, '"'))) {
        return None;
    }
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => return Some(idx + 1),
            '\\' => {
                chars.next()?;
            }
            _ => {}
        }
    }
    None
}

fn scan_number(input: &str) -> Option<usize> {
    let integer = scan_while(input, |ch| ch.is_ascii_digit());
    if integer == 0 {
        return None;
    }
    let rest = &input[integer..];
    if let Some(fraction) = rest.strip_prefix('.') {
        let digits = scan_while(fraction, |ch| ch.is_ascii_digit());
        if digits > 0 {
            return Some(integer + 1 + digits);
        }
    }
    Some(integer)
}

fn scan_operator(input: &str) -> Option<usize> {
    input
        .starts_with(['+', '-', '*', '/', ':'])
        .then_some(1)
}

fn scan_identifier(input: &str) -> Option<usize> {
    let first = input.chars().next()?;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    let tail = &input[first.len_utf8()..];
    Some(first.len_utf8() + scan_while(tail, |ch| ch.is_alphanumeric() || ch == '_'))
}

fn scan_bracket(input: &str) -> Option<usize> {
    input.starts_with(['(', ')']).then_some(1)
}

fn scan_separator(input: &str) -> Option<usize> {
    input.starts_with([';', ',']).then_some(1)
}
