use std::fmt;

use crate::{diagnostics::Span, value::Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Data,
    Import,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Data => "data",
            Self::Import => "import",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Plus),
            "-" => Some(Self::Minus),
            "data" => Some(Self::Data),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Assign => ":",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" => Some(Self::Mul),
            "/" => Some(Self::Div),
            ":" => Some(Self::Assign),
            _ => None,
        }
    }
}

/// The name an invocation targets, with its own span.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal, or the `null` literal when `None`.
    Value(Option<Value>),
    Identifier(String),
    Invocation {
        target: Identifier,
        arguments: Vec<Node>,
    },
    Unary {
        operator: UnaryOperator,
        target: Box<Node>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn value(value: Option<Value>, span: Span) -> Self {
        Self::new(NodeKind::Value(value), span)
    }

    pub fn identifier(name: impl Into<String>, span: Span) -> Self {
        Self::new(NodeKind::Identifier(name.into()), span)
    }

    pub fn unary(operator: UnaryOperator, target: Node, span: Span) -> Self {
        Self::new(
            NodeKind::Unary {
                operator,
                target: Box::new(target),
            },
            span,
        )
    }

    /// The span runs from the left operand's begin to the right operand's end.
    pub fn binary(operator: BinaryOperator, left: Node, right: Node) -> Self {
        let span = left.span.cover(right.span);
        Self::new(
            NodeKind::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn variant_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Value(_) => "value",
            NodeKind::Identifier(_) => "identifier",
            NodeKind::Invocation { .. } => "invocation",
            NodeKind::Unary { .. } => "unary operator",
            NodeKind::Binary { .. } => "binary operator",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Value(None) => write!(f, "null"),
            NodeKind::Value(Some(Value::Text(text))) => write!(f, "{text:?}"),
            NodeKind::Value(Some(value)) => write!(f, "{value}"),
            NodeKind::Identifier(name) => write!(f, "{name}"),
            NodeKind::Invocation { target, arguments } => {
                write!(f, "{}(", target.name)?;
                for (idx, argument) in arguments.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            NodeKind::Unary { operator, target } => {
                write!(f, "{}({target})", operator.symbol())
            }
            NodeKind::Binary {
                operator,
                left,
                right,
            } => write!(f, "({left} {} {right})", operator.symbol()),
        }
    }
}
