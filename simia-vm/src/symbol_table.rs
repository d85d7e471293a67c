// simia-vm - Symbol table for the Simia compiler
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Lexically nested name resolver.
//!
//! Each compilation scope carries a table linked to its enclosing table.
//! Resolving a name defined in an outer non-global, non-builtin scope
//! reifies it as a `Free` symbol in the inner table and records the
//! original in `free_symbols`, in first-reference order; the compiler later
//! turns that list into the closure's capture loads.

use std::collections::HashMap;

/// Where a symbol lives and therefore which opcode loads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    /// The currently-compiling function itself (self-recursion).
    Function,
}

/// A resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

/// A name → symbol mapping with an optional link to the enclosing table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    /// Originals of the free symbols defined here, in first-reference order.
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Create the outermost (global) table.
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Create a table enclosed by `outer`.
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    /// Tear down an enclosed table, returning its outer table.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|outer| *outer)
    }

    /// Number of names defined directly in this table.
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    /// Whether this is the outermost table.
    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// Define a name in this table. Shadows any prior entry for the same
    /// name, including a `Function` self-reference entry.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    /// Register a builtin at its table ordinal.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Register the name of the function currently being compiled so body
    /// references resolve to `CurrentClosure`. At most one per function
    /// scope.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: SymbolScope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Resolve a name, walking outward. Outer locals (and transitively
    /// outer frees) are promoted to `Free` symbols in this table.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if matches!(symbol.scope, SymbolScope::Global | SymbolScope::Builtin) {
            return Some(symbol);
        }
        Some(self.define_free(symbol))
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }
}

// ============================================================================
// Tests
// ============================================================================
