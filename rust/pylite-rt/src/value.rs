//! Runtime value representation.

use crate::builtins::Builtin;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use pylite_compiler::compiler::ast::LiteralValue;
use serde::Serialize;
use std::fmt;

/// Runtime values.
///
/// Sets and dicts keep insertion order; membership is decided by
/// [`Value::py_eq`], not by hashing.
#[derive(Debug, Clone, Serialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    /// Pure imaginary number; holds the imaginary magnitude.
    Complex(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Builtin(Builtin),
}

impl From<LiteralValue> for Value {
    fn from(lit: LiteralValue) -> Self {
        match lit {
            LiteralValue::None => Value::None,
            LiteralValue::Bool(b) => Value::Bool(b),
            LiteralValue::Int(n) => Value::Int(n),
            LiteralValue::Float(f) => Value::Float(f),
            LiteralValue::Str(s) => Value::Str(s),
            LiteralValue::Bytes(b) => Value::Bytes(b),
        }
    }
}

impl Value {
    /// Class name as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    /// `Err(type name)` for the first unhashable value found, looking into
    /// tuples.
    pub fn check_hashable(&self) -> Result<(), &'static str> {
        match self {
            Value::List(_) | Value::Set(_) | Value::Dict(_) => Err(self.type_name()),
            Value::Tuple(items) => items.iter().try_for_each(Value::check_hashable),
            _ => Ok(()),
        }
    }

    fn as_real(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Int(n) => n.to_f64(),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality with numeric cross-type comparison (`1 == 1.0 == True`).
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => a == b,
            (Value::Complex(a), b) | (b, Value::Complex(a)) => *a == 0.0 && b.as_real() == Some(0.0),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b),
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.py_eq(y))),
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2)))
            }
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (a, b) => match (a.as_real(), b.as_real()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }

    /// Text used by `print`: strings unquoted, everything else as `repr`.
    pub fn to_display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            _ => self.repr(),
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Complex(f) => format_imaginary(*f),
            Value::Str(s) => repr_str(s),
            Value::Bytes(b) => repr_bytes(b),
            Value::List(items) => format!("[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            Value::Tuple(items) => format!("({})", join_repr(items)),
            Value::Set(items) if items.is_empty() => "set()".to_string(),
            Value::Set(items) => format!("{{{}}}", join_repr(items)),
            Value::Dict(entries) => {
                let parts: Vec<String> = entries.iter().map(|(k, v)| format!("{}: {}", k.repr(), v.repr())).collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

fn seq_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Shortest round-trip float text, switching to exponent form outside
/// `1e-4 <= |f| < 1e16`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{:e}", f);
        return match text.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = exp.strip_prefix('-').map_or(("+", exp), |d| ("-", d));
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        };
    }
    if f.fract().is_zero() {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn format_imaginary(f: f64) -> String {
    let text = format_float(f);
    format!("{}j", text.strip_suffix(".0").unwrap_or(&text))
}

fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn repr_bytes(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') { b'"' } else { b'\'' };
    let mut out = String::from("b");
    out.push(char::from(quote));
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if b == quote => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x20..=0x7e => out.push(char::from(b)),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(char::from(quote));
    out
}
