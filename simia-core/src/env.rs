// simia-core - Environment for lexical scoping
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Environment for variable bindings with lexical scoping.
//!
//! Environments form a chain through parent references. Lookups walk
//! outward until the name is found; `define` always writes the innermost
//! scope; `assign` overwrites the binding in the scope that owns it and
//! never creates a new binding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::Value;

/// A lexical environment for variable bindings.
///
/// # Examples
///
/// ```
/// use simia_core::{Env, Value};
///
/// let env = Env::new();
/// env.define("x", Value::Int(42));
/// assert_eq!(env.lookup("x"), Some(Value::Int(42)));
///
/// // A child environment sees parent bindings and can shadow them.
/// let child = env.enclosed();
/// assert_eq!(child.lookup("x"), Some(Value::Int(42)));
/// child.define("x", Value::Int(100));
/// assert_eq!(child.lookup("x"), Some(Value::Int(100)));
/// assert_eq!(env.lookup("x"), Some(Value::Int(42)));
/// ```
#[derive(Debug, Clone)]
pub struct Env {
    inner: Rc<RefCell<EnvInner>>,
}

#[derive(Debug)]
struct EnvInner {
    bindings: HashMap<String, Value>,
    parent: Option<Env>,
}

impl Env {
    /// Create a new root environment with no parent.
    pub fn new() -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: None,
            })),
        }
    }

    /// Create a child environment with this environment as parent.
    #[must_use]
    pub fn enclosed(&self) -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                bindings: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Define a binding in this environment (never the parent).
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.inner.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Look up a name in this environment or the parent chain.
    /// Iterative traversal avoids blowing the stack on deep chains.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let inner = current.inner.borrow();
            if let Some(value) = inner.bindings.get(name) {
                return Some(value.clone());
            }
            let parent = inner.parent.clone();
            drop(inner);
            current = parent?;
        }
    }

    /// Overwrite an existing binding, walking the chain to the scope that
    /// owns it. Fails if the name is not bound anywhere.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut current = self.clone();
        loop {
            {
                let mut inner = current.inner.borrow_mut();
                if inner.bindings.contains_key(name) {
                    inner.bindings.insert(name.to_string(), value);
                    return Ok(());
                }
            }
            let parent = current.inner.borrow().parent.clone();
            match parent {
                Some(parent) => current = parent,
                None => return Err(Error::UndeclaredAssignment(name.to_string())),
            }
        }
    }

    /// Check whether a name is bound in this environment or a parent.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
