//! Core library for the APL scripting language: a positioned lexer, a
//! precedence-climbing parser over shared-cursor token windows, and a
//! tree-walking evaluator with a single global symbol table.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod resolver;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{AplError, Diagnostic, DiagnosticKind, Position, Span};
pub use repl::Repl;
pub use runtime::{ExecutionContext, Interpreter, RunMode, DEFAULT_EXTENSION};
pub use value::Value;
