//! Tree-walking evaluation of a parsed [`Program`].

use crate::environment::Environment;
use crate::value::Value;
use pylite_compiler::compiler::ast::{Expr, LiteralValue, Program, Stmt};
use pylite_compiler::compiler::source::SourceIndex;
use pylite_compiler::compiler::tokens::Span;
use pylite_compiler::{Diagnostic, ErrorKind};
use tracing::debug;

/// Scope name reported for top-level code.
pub const MODULE_SCOPE: &str = "<module>";

pub struct Interpreter<'s> {
    source: &'s SourceIndex,
    scope: String,
    output: String,
}

impl<'s> Interpreter<'s> {
    pub fn new(source: &'s SourceIndex) -> Self {
        Self { source, scope: MODULE_SCOPE.to_string(), output: String::new() }
    }

    /// Everything printed so far, including output produced before a
    /// runtime error.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Run every statement of `program` in `env` and return the printed
    /// output.
    pub fn interpret(&mut self, program: &Program, env: &mut Environment) -> Result<String, Diagnostic> {
        debug!(statements = program.body.len(), scope = %self.scope, "interpreting program");
        for stmt in &program.body {
            self.execute(stmt, env)?;
        }
        Ok(self.output.clone())
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::runtime_error(kind, message, span, self.scope.as_str(), self.source)
    }

    fn execute(&mut self, stmt: &Stmt, env: &mut Environment) -> Result<(), Diagnostic> {
        match stmt {
            Stmt::Expression(e) => {
                self.evaluate(&e.expression, env)?;
            }
            Stmt::Block(block) => {
                for stmt in &block.body {
                    self.execute(stmt, env)?;
                }
            }
            Stmt::Empty(_) => {}
        }
        Ok(())
    }

    fn evaluate(&mut self, expr: &Expr, env: &mut Environment) -> Result<Value, Diagnostic> {
        match expr {
            Expr::Literal { value, is_complex, .. } => Ok(match value {
                LiteralValue::Float(f) if *is_complex => Value::Complex(*f),
                other => Value::from(other.clone()),
            }),
            Expr::Identifier { name, span } => env
                .get(name)
                .cloned()
                .ok_or_else(|| self.error(ErrorKind::NameError, format!("name '{}' is not defined", name), *span)),
            Expr::List { elements, .. } => Ok(Value::List(self.evaluate_all(elements, env)?)),
            Expr::Tuple { elements, .. } => Ok(Value::Tuple(self.evaluate_all(elements, env)?)),
            Expr::Set { elements, span } => {
                let mut items: Vec<Value> = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.evaluate(element, env)?;
                    self.require_hashable(&value, element.span(), "set", *span)?;
                    if !items.iter().any(|existing| existing.py_eq(&value)) {
                        items.push(value);
                    }
                }
                Ok(Value::Set(items))
            }
            Expr::Dict { keys, values, span } => {
                let mut entries: Vec<(Value, Value)> = Vec::with_capacity(keys.len());
                for (key_expr, value_expr) in keys.iter().zip(values) {
                    let key = self.evaluate(key_expr, env)?;
                    self.require_hashable(&key, key_expr.span(), "dict", *span)?;
                    let value = self.evaluate(value_expr, env)?;
                    match entries.iter_mut().find(|(existing, _)| existing.py_eq(&key)) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(Value::Dict(entries))
            }
            Expr::Call { callee, args, keywords, span } => {
                let function = self.evaluate(callee, env)?;
                let Value::Builtin(builtin) = function else {
                    return Err(self.error(
                        ErrorKind::TypeError,
                        format!("'{}' object is not callable", function.type_name()),
                        *span,
                    ));
                };
                let args = self.evaluate_all(args, env)?;
                let mut kwargs = Vec::with_capacity(keywords.len());
                for keyword in keywords {
                    kwargs.push((keyword.name.clone(), self.evaluate(&keyword.value, env)?));
                }
                builtin
                    .call(args, kwargs, &mut self.output)
                    .map_err(|e| self.error(e.kind(), e.to_string(), *span))
            }
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr], env: &mut Environment) -> Result<Vec<Value>, Diagnostic> {
        exprs.iter().map(|e| self.evaluate(e, env)).collect()
    }

    /// An unhashable element is reported as the cause of a failure to
    /// build the whole literal.
    fn require_hashable(&self, value: &Value, at: Span, literal: &str, literal_span: Span) -> Result<(), Diagnostic> {
        value.check_hashable().map_err(|type_name| {
            let cause = self.error(ErrorKind::TypeError, format!("unhashable type: '{}'", type_name), at);
            self.error(ErrorKind::TypeError, format!("cannot build {} literal", literal), literal_span)
                .with_cause(cause)
        })
    }
}
