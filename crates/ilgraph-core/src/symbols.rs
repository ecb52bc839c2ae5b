//! Symbol reference table for loads, stores and calls

use crate::model::SymbolRef;
use std::collections::HashMap;

/// Maps symbol references to their printable names.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    /// For fast lookup: name -> reference
    by_name: HashMap<String, SymbolRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            names: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Return the reference for a name, creating one on first use.
    pub fn intern(&mut self, name: &str) -> SymbolRef {
        if let Some(symbol) = self.by_name.get(name) {
            return *symbol;
        }
        let symbol = SymbolRef(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), symbol);
        symbol
    }

    /// Look up a symbol's name.
    pub fn name(&self, symbol: SymbolRef) -> Option<&str> {
        self.names.get(symbol.0 as usize).map(String::as_str)
    }

    /// Look up a symbol by name.
    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
