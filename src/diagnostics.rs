use std::fmt;

use thiserror::Error;

/// A zero-based line/column coordinate in a source string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Returns the position reached after reading `ch`.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self::new(self.line + 1, 0)
        } else {
            Self::new(self.line, self.column + 1)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// Begin/end coordinates of a token or syntax node. `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub begin: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    pub const fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Self {
        Self::new(self.begin.min(other.begin), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} to {}", self.begin, self.end)
    }
}

/// Classification of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    Eval,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lex error"),
            Self::Parse => write!(f, "parse error"),
            Self::Eval => write!(f, "eval error"),
        }
    }
}

/// Rich diagnostic information surfaced to end users.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<Span>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Lex, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, message)
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Eval, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Where the problem starts, if known.
    pub fn position(&self) -> Option<Position> {
        self.span.map(|span| span.begin)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(position) = self.position() {
            write!(f, " at {position}")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the interpreter.
#[derive(Debug, Error)]
pub enum AplError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AplError {
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Diagnostic(diagnostic) => Some(diagnostic),
            Self::Io(_) => None,
        }
    }

    pub fn kind(&self) -> Option<DiagnosticKind> {
        self.diagnostic().map(|diagnostic| diagnostic.kind)
    }

    pub(crate) fn with_note(self, note: impl Into<String>) -> Self {
        match self {
            Self::Diagnostic(diagnostic) => Self::Diagnostic(diagnostic.with_note(note)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AplError>;
