use colored::Colorize;
use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    diagnostics::{AplError, Result},
    runtime::{ExecutionContext, Interpreter},
    stdlib, value,
};

pub struct Repl {
    interpreter: Interpreter,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_context(context: ExecutionContext) -> Self {
        Self {
            interpreter: Interpreter::with_context(context),
        }
    }

    /// Evaluates one line and reports the outcome; errors never end the
    /// session.
    pub fn submit(&mut self, line: &str) {
        match self.interpreter.eval_source(line) {
            Ok(Some(result)) => println!("{}", value::display(Some(&result)).green()),
            Ok(None) => {}
            Err(err) => report(&err),
        }
    }

    /// Preloads scripts the way the prompt would see them typed in.
    pub fn preload(&mut self, scripts: &[String]) {
        for script in scripts {
            let instruction = import_instruction(script);
            println!("{}", instruction.dimmed());
            self.submit(&instruction);
        }
    }

    /// Lists every name in the symbol table with its current value.
    pub fn print_memory(&self) {
        let memory = self.interpreter.memory();
        for name in memory.names() {
            let Some(cell) = memory.cell(name) else {
                continue;
            };
            let line = format!("{name} = {}", value::display(cell.value.as_ref()));
            if cell.mutable {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        loop {
            match editor.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == ":quit" || trimmed == ":exit" {
                        break;
                    }
                    if trimmed.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    match trimmed {
                        ":memory" => self.print_memory(),
                        ":builtins" => print_builtins(),
                        _ => self.submit(trimmed),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(readline_error(err)),
            }
        }
        Ok(())
    }
}

/// The `import "<script>";` line a preloaded script is run through.
pub fn import_instruction(script: &str) -> String {
    let literal = script.replace('\\', "\\\\").replace('"', "\\\"");
    format!("import \"{literal}\";")
}

fn print_builtins() {
    for name in stdlib::builtin_names() {
        println!("{}", name.yellow());
    }
}

pub fn report(err: &AplError) {
    eprintln!("{}", err.to_string().red());
}

fn readline_error(err: ReadlineError) -> AplError {
    AplError::from(std::io::Error::new(std::io::ErrorKind::Other, err))
}
