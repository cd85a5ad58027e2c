use std::time::Duration;

use clap::ValueEnum;

use crate::{
    ast::{BinaryOperator, Identifier, Node, NodeKind, UnaryOperator},
    diagnostics::{Diagnostic, Result, Span},
    environment::Environment,
    parser,
    resolver::{ResourceResolver, SourceResolver},
    stdlib::{self, Output, StdoutOutput},
    value::Value,
};

pub const DEFAULT_EXTENSION: &str = "apl";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    #[default]
    Run,
    /// Echo every parsed tree to stderr before evaluating it.
    Debug,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub mode: RunMode,
    /// Extension a local import must carry, compared case-insensitively.
    pub extension: String,
    pub fetch_timeout: Duration,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            mode: RunMode::Run,
            extension: DEFAULT_EXTENSION.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Owns the symbol table and the collaborators evaluation talks to.
pub struct Interpreter {
    memory: Environment,
    context: ExecutionContext,
    output: Box<dyn Output>,
    resolver: Box<dyn ResourceResolver>,
    /// Origins of the imports currently being evaluated, innermost last.
    imports: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_context(ExecutionContext::default())
    }

    pub fn with_context(context: ExecutionContext) -> Self {
        let resolver = SourceResolver::new(context.extension.clone(), context.fetch_timeout);
        let mut memory = Environment::new();
        stdlib::install(&mut memory);
        Self {
            memory,
            context,
            output: Box::new(StdoutOutput),
            resolver: Box::new(resolver),
            imports: Vec::new(),
        }
    }

    pub fn with_output(mut self, output: impl Output + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn with_resolver(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn memory(&self) -> &Environment {
        &self.memory
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Tokenizes, parses and evaluates `source`, returning the value of the
    /// last statement.
    pub fn eval_source(&mut self, source: &str) -> Result<Option<Value>> {
        let trees = parser::parse_source(source)?;
        self.evaluate(&trees)
    }

    /// Evaluates statements in order, stopping at the first error.
    pub fn evaluate(&mut self, trees: &[Node]) -> Result<Option<Value>> {
        let mut last = None;
        for tree in trees {
            if self.context.mode == RunMode::Debug {
                eprintln!("tree: {tree}");
            }
            last = self.value_of(tree)?;
        }
        Ok(last)
    }

    /// Resolves `address` and runs the returned source in this interpreter.
    /// Resolution failures carry no span.
    pub fn import(&mut self, address: &str) -> Result<()> {
        self.import_at(address, None)
    }

    fn import_at(&mut self, address: &str, span: Option<Span>) -> Result<()> {
        let located = |diagnostic: Diagnostic| match span {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        };
        let resource = self.resolver.resolve(address).map_err(|failures| {
            failures.iter().fold(
                located(Diagnostic::eval(format!("resource '{address}' not found"))),
                |diagnostic, failure| diagnostic.with_note(failure.to_string()),
            )
        })?;
        if self.imports.contains(&resource.origin) {
            let chain = self.imports.join(" -> ");
            return Err(located(Diagnostic::eval(format!(
                "import cycle: '{}' is already being imported",
                resource.origin
            )))
            .with_note(format!("import chain: {chain}"))
            .into());
        }
        self.imports.push(resource.origin);
        let outcome = self.eval_source(&resource.source);
        self.imports.pop();
        outcome
            .map(|_| ())
            .map_err(|err| err.with_note(format!("while importing '{address}'")))
    }

    fn value_of(&mut self, node: &Node) -> Result<Option<Value>> {
        match &node.kind {
            NodeKind::Value(value) => Ok(value.clone()),
            NodeKind::Identifier(name) => Ok(self.memory.get(name, node.span)?),
            NodeKind::Invocation { target, arguments } => self.invoke(target, arguments),
            NodeKind::Unary { operator, target } => match operator {
                UnaryOperator::Plus | UnaryOperator::Minus => {
                    let arithmetic = if *operator == UnaryOperator::Plus {
                        BinaryOperator::Add
                    } else {
                        BinaryOperator::Sub
                    };
                    let operand = self.value_of(target)?;
                    Ok(arithmetic_on(
                        arithmetic,
                        Some(Value::Number(0.0)),
                        operand,
                        node.span,
                    )?)
                }
                UnaryOperator::Data => {
                    let name = self.identifier_of(node)?;
                    Ok(self.memory.get(&name, node.span)?)
                }
                UnaryOperator::Import => {
                    let address = match self.value_of(target)? {
                        Some(Value::Text(address)) => address,
                        other => {
                            let found = other.as_ref().map_or("null", Value::type_name);
                            return Err(Diagnostic::eval(format!(
                                "import target must be Text, found {found}"
                            ))
                            .with_span(target.span)
                            .into());
                        }
                    };
                    self.import_at(&address, Some(node.span))?;
                    Ok(None)
                }
            },
            NodeKind::Binary {
                operator: BinaryOperator::Assign,
                ..
            } => {
                let name = self.identifier_of(node)?;
                Ok(self.memory.get(&name, node.span)?)
            }
            NodeKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.value_of(left)?;
                let right = self.value_of(right)?;
                Ok(arithmetic_on(*operator, left, right, node.span)?)
            }
        }
    }

    /// Resolves `node` to a name, performing the declaration or assignment
    /// it describes along the way.
    fn identifier_of(&mut self, node: &Node) -> Result<String> {
        match &node.kind {
            NodeKind::Identifier(name) => Ok(name.clone()),
            NodeKind::Unary {
                operator: UnaryOperator::Data,
                target,
            } => {
                let name = self.identifier_of(target)?;
                self.memory.declare(&name, node.span)?;
                Ok(name)
            }
            NodeKind::Binary {
                operator: BinaryOperator::Assign,
                left,
                right,
            } => {
                let value = self.value_of(right)?;
                let name = self.identifier_of(left)?;
                self.memory.assign(&name, value, node.span)?;
                Ok(name)
            }
            _ => Err(Diagnostic::eval(format!(
                "unable to evaluate identifier from {}",
                node.variant_name()
            ))
            .with_span(node.span)
            .into()),
        }
    }

    fn invoke(&mut self, target: &Identifier, arguments: &[Node]) -> Result<Option<Value>> {
        let builtin = stdlib::lookup(&target.name).ok_or_else(|| {
            Diagnostic::eval(format!("function '{}' does not exist", target.name))
                .with_span(target.span)
        })?;
        let values = arguments
            .iter()
            .map(|argument| self.value_of(argument))
            .collect::<Result<Vec<_>>>()?;
        (builtin.callback)(self.output.as_mut(), &values)
    }
}

fn arithmetic_on(
    operator: BinaryOperator,
    left: Option<Value>,
    right: Option<Value>,
    span: Span,
) -> std::result::Result<Option<Value>, Diagnostic> {
    let left = number_operand(operator, left.as_ref(), span)?;
    let right = number_operand(operator, right.as_ref(), span)?;
    let result = match operator {
        BinaryOperator::Add => left + right,
        BinaryOperator::Sub => left - right,
        BinaryOperator::Mul => left * right,
        BinaryOperator::Div => left / right,
        BinaryOperator::Assign => {
            return Err(Diagnostic::eval("':' is not an arithmetic operator").with_span(span));
        }
    };
    Ok(Some(Value::Number(result)))
}

fn number_operand(
    operator: BinaryOperator,
    operand: Option<&Value>,
    span: Span,
) -> std::result::Result<f64, Diagnostic> {
    match operand {
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(Diagnostic::eval(format!(
            "operator '{}' cannot be applied to {} operand",
            operator.symbol(),
            other.type_name()
        ))
        .with_span(span)),
        None => Err(Diagnostic::eval(format!(
            "operator '{}' cannot be applied to null operand",
            operator.symbol()
        ))
        .with_span(span)),
    }
}
