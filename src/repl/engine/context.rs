//! Evaluation Context
//!
//! Bindings visible to an evaluator for one line. The session hands every
//! line a fresh, empty context.

use indexmap::IndexMap;

use crate::repl::value::Value;

/// Name → value bindings
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    bindings: IndexMap<String, Value>,
}

impl EvalContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) {
        self.bindings.insert(name.into(), value);
    }

    /// Look up a name
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over bindings in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }
}
