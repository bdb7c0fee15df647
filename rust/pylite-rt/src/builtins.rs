//! Builtin functions available to every program.

use crate::value::Value;
use num_bigint::BigInt;
use pylite_compiler::ErrorKind;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Print,
    Len,
    Repr,
}

/// Failure inside a builtin call. The interpreter turns it into a
/// diagnostic located at the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("{name}() got an unexpected keyword argument '{keyword}'")]
    UnexpectedKeyword { name: &'static str, keyword: String },
    #[error("{name}() takes no keyword arguments")]
    NoKeywords { name: &'static str },
    #[error("{name}() takes exactly one argument ({given} given)")]
    ArgumentCount { name: &'static str, given: usize },
    #[error("object of type '{0}' has no len()")]
    NoLen(&'static str),
    #[error("{keyword} must be None or a string, not {found}")]
    NotAString { keyword: &'static str, found: &'static str },
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TypeError
    }
}

impl Builtin {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Call with evaluated arguments. `print` appends to `out`.
    pub fn call(self, args: Vec<Value>, keywords: Vec<(String, Value)>, out: &mut String) -> Result<Value, CallError> {
        trace!(builtin = self.name(), args = args.len(), keywords = keywords.len(), "call");
        match self {
            Builtin::Print => print(args, keywords, out),
            Builtin::Len => {
                let arg = single_argument(self, args, keywords)?;
                let len = match &arg {
                    Value::Str(s) => s.chars().count(),
                    Value::Bytes(b) => b.len(),
                    Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len(),
                    Value::Dict(entries) => entries.len(),
                    other => return Err(CallError::NoLen(other.type_name())),
                };
                Ok(Value::Int(BigInt::from(len)))
            }
            Builtin::Repr => {
                let arg = single_argument(self, args, keywords)?;
                Ok(Value::Str(arg.repr()))
            }
        }
    }
}

fn single_argument(builtin: Builtin, args: Vec<Value>, keywords: Vec<(String, Value)>) -> Result<Value, CallError> {
    let name = builtin.name();
    if !keywords.is_empty() {
        return Err(CallError::NoKeywords { name });
    }
    let given = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(CallError::ArgumentCount { name, given }),
    }
}

/// `print(*args, sep=' ', end='\n')`
fn print(args: Vec<Value>, keywords: Vec<(String, Value)>, out: &mut String) -> Result<Value, CallError> {
    let mut sep = " ".to_string();
    let mut end = "\n".to_string();
    for (keyword, value) in keywords {
        let (name, slot) = match keyword.as_str() {
            "sep" => ("sep", &mut sep),
            "end" => ("end", &mut end),
            _ => return Err(CallError::UnexpectedKeyword { name: "print", keyword: keyword.clone() }),
        };
        match value {
            Value::Str(s) => *slot = s,
            Value::None => {}
            other => return Err(CallError::NotAString { keyword: name, found: other.type_name() }),
        }
    }
    let parts: Vec<String> = args.iter().map(Value::to_display).collect();
    out.push_str(&parts.join(sep.as_str()));
    out.push_str(&end);
    Ok(Value::None)
}
