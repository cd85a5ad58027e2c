use std::{
    cell::RefCell,
    f64::consts,
    io::{self, Write as _},
    rc::Rc,
};

use crate::{
    diagnostics::Result,
    environment::Environment,
    value::{self, Value},
};

/// Receives one line of text per `Write` invocation.
pub trait Output {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// Collects lines in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Output for CapturedOutput {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}

pub type BuiltinCallback = fn(&mut dyn Output, &[Option<Value>]) -> Result<Option<Value>>;

pub struct Builtin {
    pub name: &'static str,
    pub callback: BuiltinCallback,
}

static BUILTINS: [Builtin; 1] = [Builtin {
    name: "Write",
    callback: io_write,
}];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|builtin| builtin.name)
}

/// Pre-populates the non-mutable constants.
pub fn install(env: &mut Environment) {
    env.define("Pi", Some(Value::Number(consts::PI)), false);
    env.define("E", Some(Value::Number(consts::E)), false);
}

fn io_write(output: &mut dyn Output, args: &[Option<Value>]) -> Result<Option<Value>> {
    let line = args
        .iter()
        .map(|arg| value::display(arg.as_ref()))
        .collect::<Vec<_>>()
        .join("\n");
    output.write_line(&line)?;
    Ok(None)
}
