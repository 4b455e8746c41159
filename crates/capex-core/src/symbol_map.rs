//! Variable identities and the symbol map that assigns them.
//!
//! A [`SymbolMap`] hands out a [`VariableId`] for every variable declared on
//! a [`ModelInstance`](crate::ModelInstance), in declaration order. Two
//! instances built from the same data in the same order therefore agree on
//! the id of every identically named variable, which is what lets a
//! scenario tree node list first-stage ids once and match them in every
//! scenario.
//!
//! Algorithms never reach for the symbol map of a model directly; they take a
//! [`SymbolResolver`], so tests can inject a plain `HashMap`.

use good_lp::Variable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Stable identity of one decision variable within a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(usize);

impl VariableId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        VariableId(value)
    }

    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identity and display name of a resolved variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub id: VariableId,
    pub name: String,
}

impl Symbol {
    pub fn new(id: VariableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Maps a variable handle of type `V` to its stable identity.
///
/// Returning `None` means the variable is unknown to the resolver.
pub trait SymbolResolver<V> {
    fn resolve(&self, var: &V) -> Option<Symbol>;
}

impl<V: Eq + Hash> SymbolResolver<V> for HashMap<V, Symbol> {
    fn resolve(&self, var: &V) -> Option<Symbol> {
        self.get(var).cloned()
    }
}

/// Symbol table for the variables of one model instance.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    ids: HashMap<Variable, VariableId>,
    names: Vec<String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable, returning its id. Registering the same handle
    /// twice returns the id assigned the first time.
    pub fn register(&mut self, var: Variable, name: impl Into<String>) -> VariableId {
        if let Some(id) = self.ids.get(&var) {
            return *id;
        }
        let id = VariableId::new(self.names.len());
        self.names.push(name.into());
        self.ids.insert(var, id);
        id
    }

    pub fn id(&self, var: Variable) -> Option<VariableId> {
        self.ids.get(&var).copied()
    }

    pub fn name(&self, id: VariableId) -> Option<&str> {
        self.names.get(id.value()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SymbolResolver<Variable> for SymbolMap {
    fn resolve(&self, var: &Variable) -> Option<Symbol> {
        let id = self.id(*var)?;
        let name = self.name(id)?;
        Some(Symbol::new(id, name))
    }
}
