use std::{cell::Cell, rc::Rc, str::Chars};

use crate::{
    ast::{BinaryOperator, Identifier, Node, NodeKind, UnaryOperator},
    diagnostics::{Diagnostic, Position, Span},
    lexer::{Token, TokenKind, tokenize},
    value::Value,
};

/// Opening brackets and the bracket that closes each of them.
const BRACKET_PAIRS: [(&str, &str); 1] = [("(", ")")];

pub fn parse_source(source: &str) -> Result<Vec<Node>, Diagnostic> {
    let tokens = tokenize(source)?;
    parse(&tokens)
}

/// Parses `;`-terminated statements, one tree per statement.
pub fn parse(tokens: &[Token]) -> Result<Vec<Node>, Diagnostic> {
    let window = Window::new(tokens);
    let mut trees = Vec::new();
    while window.index() < tokens.len() {
        let tree = parse_assignment(&window)?;
        match window.token() {
            Some(token) if token.is(TokenKind::Separator, ";") => window.advance(),
            Some(token) => {
                return Err(Diagnostic::parse(format!("expected ';', found '{}'", token.text))
                    .with_span(token.span));
            }
            None => {
                return Err(Diagnostic::parse("expected ';'")
                    .with_span(Span::point(window.end_position())));
            }
        }
        trees.push(tree);
    }
    Ok(trees)
}

/// A `[begin, end)` view over a token buffer.
///
/// Every window derived from another through [`Window::sub_window`] shares
/// the same cursor, so nested parses move one global position while being
/// unable to read tokens outside their own bounds.
#[derive(Debug, Clone)]
pub struct Window<'t> {
    tokens: &'t [Token],
    begin: usize,
    end: usize,
    cursor: Rc<Cell<usize>>,
}

impl<'t> Window<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            begin: 0,
            end: tokens.len(),
            cursor: Rc::new(Cell::new(0)),
        }
    }

    /// A narrower view sharing this window's cursor. Bounds are clamped to
    /// the parent's.
    pub fn sub_window(&self, begin: usize, end: usize) -> Self {
        let begin = begin.clamp(self.begin, self.end);
        Self {
            tokens: self.tokens,
            begin,
            end: end.clamp(begin, self.end),
            cursor: Rc::clone(&self.cursor),
        }
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    pub fn shares_cursor_with(&self, other: &Window<'_>) -> bool {
        Rc::ptr_eq(&self.cursor, &other.cursor)
    }

    pub fn index(&self) -> usize {
        self.cursor.get()
    }

    pub fn seek(&self, index: usize) {
        self.cursor.set(index);
    }

    pub fn advance(&self) {
        self.cursor.set(self.cursor.get() + 1);
    }

    pub fn in_range(&self) -> bool {
        (self.begin..self.end).contains(&self.index())
    }

    /// The token under the cursor, if the cursor is inside this window.
    pub fn token(&self) -> Option<&'t Token> {
        if self.in_range() {
            self.tokens.get(self.index())
        } else {
            None
        }
    }

    /// End of the last token this window can see, or of the token just
    /// before it when the window is empty.
    pub fn end_position(&self) -> Position {
        self.tokens[..self.end]
            .last()
            .map_or_else(Position::default, |token| token.span.end)
    }

    fn current_position(&self) -> Position {
        self.token()
            .map_or_else(|| self.end_position(), |token| token.span.begin)
    }
}

type Operand = fn(&Window<'_>) -> Result<Node, Diagnostic>;

fn parse_assignment(window: &Window<'_>) -> Result<Node, Diagnostic> {
    parse_left_associative(window, &[BinaryOperator::Assign], parse_additive)
}

fn parse_additive(window: &Window<'_>) -> Result<Node, Diagnostic> {
    parse_left_associative(
        window,
        &[BinaryOperator::Add, BinaryOperator::Sub],
        parse_multiplicative,
    )
}

fn parse_multiplicative(window: &Window<'_>) -> Result<Node, Diagnostic> {
    parse_left_associative(
        window,
        &[BinaryOperator::Mul, BinaryOperator::Div],
        parse_vertex,
    )
}

fn parse_left_associative(
    window: &Window<'_>,
    operators: &[BinaryOperator],
    operand: Operand,
) -> Result<Node, Diagnostic> {
    let mut left = operand(window)?;
    while let Some(operator) = window
        .token()
        .and_then(binary_operator)
        .filter(|operator| operators.contains(operator))
    {
        window.advance();
        let right = operand(window)?;
        left = Node::binary(operator, left, right);
    }
    Ok(left)
}

fn binary_operator(token: &Token) -> Option<BinaryOperator> {
    if token.kind == TokenKind::Operator {
        BinaryOperator::from_symbol(&token.text)
    } else {
        None
    }
}

fn parse_vertex(window: &Window<'_>) -> Result<Node, Diagnostic> {
    let Some(token) = window.token() else {
        return Err(Diagnostic::parse("expected expression")
            .with_span(Span::point(window.current_position())));
    };
    match token.kind {
        TokenKind::Number => {
            let number = token
                .text
                .parse::<f64>()
                .map_err(|_| unexpected(token, "malformed number"))?;
            window.advance();
            Ok(Node::value(Some(Value::Number(number)), token.span))
        }
        TokenKind::String => {
            let text = unescape(token)?;
            window.advance();
            Ok(Node::value(Some(Value::Text(text)), token.span))
        }
        TokenKind::Identifier => {
            window.advance();
            match window.token() {
                Some(next) if next.is(TokenKind::Bracket, "(") => parse_invocation(window, token),
                _ => Ok(Node::identifier(token.text.clone(), token.span)),
            }
        }
        TokenKind::Keyword if token.text == "null" => {
            window.advance();
            Ok(Node::value(None, token.span))
        }
        TokenKind::Keyword => parse_prefix(window, token),
        TokenKind::Operator if token.is_any(TokenKind::Operator, &["+", "-"]) => {
            parse_prefix(window, token)
        }
        TokenKind::Bracket if opening_pair(&token.text).is_some() => {
            let inner = enclosed(window)?;
            let node = parse_assignment(&inner)?;
            close(window, &inner)?;
            Ok(node)
        }
        _ => Err(unexpected(token, "unidentified token")),
    }
}

/// `data`, `import` and sign prefixes apply to one vertex.
fn parse_prefix(window: &Window<'_>, token: &Token) -> Result<Node, Diagnostic> {
    let operator = UnaryOperator::from_symbol(&token.text)
        .ok_or_else(|| unexpected(token, "unidentified prefix"))?;
    window.advance();
    let target = parse_vertex(window)?;
    let span = token.span.cover(target.span);
    Ok(Node::unary(operator, target, span))
}

fn parse_invocation(window: &Window<'_>, name: &Token) -> Result<Node, Diagnostic> {
    let inner = enclosed(window)?;
    let arguments = parse_arguments(&inner)?;
    let closing = close(window, &inner)?;
    Ok(Node::new(
        NodeKind::Invocation {
            target: Identifier {
                name: name.text.clone(),
                span: name.span,
            },
            arguments,
        },
        name.span.cover(closing.span),
    ))
}

fn parse_arguments(window: &Window<'_>) -> Result<Vec<Node>, Diagnostic> {
    let mut arguments = Vec::new();
    if !window.in_range() {
        return Ok(arguments);
    }
    loop {
        arguments.push(parse_assignment(window)?);
        let Some(token) = window.token() else {
            break;
        };
        if !token.is(TokenKind::Separator, ",") {
            return Err(Diagnostic::parse(format!("expected ',', found '{}'", token.text))
                .with_span(token.span));
        }
        window.advance();
    }
    Ok(arguments)
}

fn opening_pair(bracket: &str) -> Option<&'static str> {
    BRACKET_PAIRS
        .iter()
        .find(|(open, _)| *open == bracket)
        .map(|(_, close)| *close)
}

/// Finds the bracket matching the one under the cursor and returns the
/// window strictly between them, with the cursor at its first token.
fn enclosed<'t>(window: &Window<'t>) -> Result<Window<'t>, Diagnostic> {
    let open = window.token().ok_or_else(|| {
        Diagnostic::parse("expected '('").with_span(Span::point(window.current_position()))
    })?;
    let pair = opening_pair(&open.text).ok_or_else(|| {
        unexpected(open, &format!("unable to get pair of '{}'", open.text))
    })?;
    let begin = window.index() + 1;
    let mut depth = 1usize;
    for index in begin..window.end {
        let token = &window.tokens[index];
        if token.is(TokenKind::Bracket, &open.text) {
            depth += 1;
        } else if token.is(TokenKind::Bracket, pair) {
            depth -= 1;
            if depth == 0 {
                window.seek(begin);
                return Ok(window.sub_window(begin, index));
            }
        }
    }
    Err(Diagnostic::parse(format!("expected '{pair}'"))
        .with_span(Span::point(window.end_position()))
        .with_note(format!("'{}' opened at {}", open.text, open.span.begin)))
}

/// Checks that `inner` was fully consumed and steps past its closing bracket.
fn close<'t>(window: &Window<'t>, inner: &Window<'t>) -> Result<&'t Token, Diagnostic> {
    let closing = &window.tokens[inner.end];
    if let Some(stray) = inner.token() {
        return Err(Diagnostic::parse(format!(
            "expected '{}', found '{}'",
            closing.text, stray.text
        ))
        .with_span(stray.span));
    }
    window.seek(inner.end + 1);
    Ok(closing)
}

fn unexpected(token: &Token, message: &str) -> Diagnostic {
    Diagnostic::parse(format!("{message} '{}'", token.text)).with_span(token.span)
}

fn unescape(token: &Token) -> Result<String, Diagnostic> {
    let body = token
        .text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| unexpected(token, "malformed string"))?;
    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        let decoded = match chars.next() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => unicode_escape(&mut chars).ok_or_else(|| {
                Diagnostic::parse("invalid unicode escape in string").with_span(token.span)
            })?,
            other => {
                let escape = other.map(String::from).unwrap_or_default();
                return Err(
                    Diagnostic::parse(format!("invalid escape '\\{escape}' in string"))
                        .with_span(token.span),
                );
            }
        };
        text.push(decoded);
    }
    Ok(text)
}

/// Decodes the `XXXX` of a `\uXXXX` escape. A high surrogate must be followed
/// by a `\uXXXX` low surrogate; the pair becomes one character.
fn unicode_escape(chars: &mut Chars<'_>) -> Option<char> {
    let high = code_unit(chars)?;
    let low = if (0xD800..0xDC00).contains(&high) {
        if chars.next() != Some('\\') || chars.next() != Some('u') {
            return None;
        }
        Some(code_unit(chars)?)
    } else {
        None
    };
    char::decode_utf16(std::iter::once(high).chain(low))
        .next()?
        .ok()
}

fn code_unit(chars: &mut Chars<'_>) -> Option<u16> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(&digits, 16).ok()
}
