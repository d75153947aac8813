//! The symbol table: every name a formula can see.
//!
//! Holds the builtin namespace (constants and functions) and one entry per
//! cell label. Formulas only ever read it; writes happen through the owning
//! sheet's edit transaction.

use std::collections::HashMap;
use thiserror::Error;

use super::Value;

/// Names starting with this prefix are internal to a namespace and never
/// imported.
pub const RESERVED_PREFIX: &str = "__";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("name '{0}' is not defined")]
pub struct UnknownSymbol(pub String);

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
    reserved_prefix: String,
}

/// Full copy of a symbol table's entries.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolSnapshot(HashMap<String, Value>);

impl SymbolTable {
    pub fn new() -> Self {
        Self::with_reserved_prefix(RESERVED_PREFIX)
    }

    pub fn with_reserved_prefix(prefix: &str) -> Self {
        SymbolTable {
            symbols: HashMap::new(),
            reserved_prefix: prefix.to_string(),
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        !self.reserved_prefix.is_empty() && name.starts_with(&self.reserved_prefix)
    }

    /// Bulk-load a namespace, skipping reserved names.
    /// Returns the number of names imported.
    pub fn import_namespace<I, S>(&mut self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut imported = 0;
        let mut skipped = 0;
        for (name, value) in pairs {
            let name = name.as_ref();
            if self.is_reserved(name) {
                skipped += 1;
                continue;
            }
            self.symbols.insert(name.to_string(), value);
            imported += 1;
        }
        tracing::info!(imported, skipped, "imported symbols into the symbol table");
        imported
    }

    pub fn get(&self, name: &str) -> Result<&Value, UnknownSymbol> {
        self.symbols
            .get(name)
            .ok_or_else(|| UnknownSymbol(name.to_string()))
    }

    /// Set a name, returning what it held before.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.symbols.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.symbols.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn snapshot(&self) -> SymbolSnapshot {
        SymbolSnapshot(self.symbols.clone())
    }

    pub fn restore(&mut self, snapshot: SymbolSnapshot) {
        self.symbols = snapshot.0;
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
