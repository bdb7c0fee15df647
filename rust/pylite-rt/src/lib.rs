//! pylite RT: a tree-walking evaluator for programs produced by
//! `pylite-compiler`.
//!
//! Builtins are registered in an explicit [`Environment`] that the caller
//! builds and passes to [`Interpreter::interpret`]; there is no global
//! interpreter state.

pub mod builtins;
pub mod environment;
pub mod interpreter;
pub mod value;

pub use builtins::{Builtin, CallError};
pub use environment::Environment;
pub use interpreter::{Interpreter, MODULE_SCOPE};
pub use value::Value;
