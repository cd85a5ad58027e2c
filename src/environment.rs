use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, Span},
    value::Value,
};

/// A named storage cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Datul {
    pub value: Option<Value>,
    pub mutable: bool,
}

/// The single global namespace every statement reads and writes.
#[derive(Debug, Default)]
pub struct Environment {
    cells: IndexMap<String, Datul>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a cell unconditionally. Used for interpreter-provided names.
    pub fn define(&mut self, name: impl Into<String>, value: Option<Value>, mutable: bool) {
        self.cells.insert(name.into(), Datul { value, mutable });
    }

    /// Creates a mutable, null-valued cell for a `data` declaration.
    pub fn declare(&mut self, name: &str, span: Span) -> Result<(), Diagnostic> {
        if self.cells.contains_key(name) {
            return Err(
                Diagnostic::eval(format!("identifier '{name}' already exists")).with_span(span)
            );
        }
        self.define(name, None, true);
        Ok(())
    }

    pub fn assign(&mut self, name: &str, value: Option<Value>, span: Span) -> Result<(), Diagnostic> {
        let Some(cell) = self.cells.get_mut(name) else {
            return Err(undefined(name, span));
        };
        if !cell.mutable {
            return Err(
                Diagnostic::eval(format!("identifier '{name}' is non-mutable")).with_span(span)
            );
        }
        cell.value = value;
        Ok(())
    }

    pub fn get(&self, name: &str, span: Span) -> Result<Option<Value>, Diagnostic> {
        self.cells
            .get(name)
            .map(|cell| cell.value.clone())
            .ok_or_else(|| undefined(name, span))
    }

    pub fn cell(&self, name: &str) -> Option<&Datul> {
        self.cells.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn undefined(name: &str, span: Span) -> Diagnostic {
    Diagnostic::eval(format!("identifier '{name}' does not exist")).with_span(span)
}
