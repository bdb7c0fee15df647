//! Name bindings.

use crate::builtins::Builtin;
use crate::value::Value;
use std::collections::HashMap;
use strum::IntoEnumIterator;

/// A scope mapping names to values, with an optional enclosing scope.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    /// An empty scope with no builtins.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope holding every [`Builtin`] under its name.
    pub fn with_builtins() -> Self {
        let mut env = Self::new();
        for builtin in Builtin::iter() {
            env.set(builtin.name(), Value::Builtin(builtin));
        }
        env
    }

    /// Look a name up here, then in enclosing scopes.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.store.get(name).or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }

    /// Open a nested scope whose lookups fall back to `self`.
    pub fn child(self) -> Environment {
        Environment { store: HashMap::new(), parent: Some(Box::new(self)) }
    }

    /// Close this scope and return the enclosing one.
    pub fn into_parent(self) -> Option<Environment> {
        self.parent.map(|p| *p)
    }
}
