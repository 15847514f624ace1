//! Global variable store.
//!
//! Script variables live in one global table.  `g:name` and `name` refer to
//! the same entry.

use std::collections::HashMap;

use crate::script::value::Value;

/// Strip the optional `g:` scope prefix.
fn key(name: &str) -> &str {
    name.strip_prefix("g:").unwrap_or(name)
}

/// Global name → value store.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: HashMap<String, Value>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(key(name).to_owned(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(key(name))
    }

    /// Remove a variable, returning its last value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(key(name))
    }

    /// Returns `true` if the variable is set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(key(name))
    }

    /// Iterate over all variables.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
