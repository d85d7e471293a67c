// simia-core - Value types for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Core value type for Simia.
//!
//! [`Value`] is the central enum representing all runtime values, shared by
//! the evaluator and the virtual machine. Composites use `im` persistent
//! collections, so cloning a value is cheap and `append` can return a new
//! array without copying the original.

use std::fmt;
use std::rc::Rc;

use im::{OrdMap, Vector};

use simia_bytecode::Instructions;
use simia_parser::ast::{BlockStatement, Identifier};

use crate::env::Env;
use crate::error::Result;

/// Signature of a native (builtin) function.
pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

/// A Simia runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
    Nil,
    Array(Vector<Value>),
    Hash(OrdMap<String, Value>),
    /// Half-open integer range; iteration excludes `end` and steps towards it.
    Range(i64, i64),
    /// Internal wrapper that carries a `return` out of nested blocks.
    /// Never observable outside a function or program.
    Return(Box<Value>),
    /// Evaluator function: parameters, body and the captured environment.
    Function(Rc<Function>),
    /// Compiled bytecode function, before closure creation.
    CompiledFunction(Rc<CompiledFunction>),
    /// A compiled function paired with its captured free values.
    Closure(Rc<Closure>),
    /// Native function.
    Builtin(Builtin),
}

/// A user function as the evaluator sees it: the parameter list, the body
/// and the environment captured at the definition site.
#[derive(Debug)]
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Env,
}

/// A compiled function: its instruction stream plus the local-slot and
/// parameter counts the VM needs to set up a call frame.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A closure: a compiled function with the free values it captured, in
/// first-reference order.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// A named native function. The ordered table lives in [`crate::builtins`].
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Value {
    /// The uppercase type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Nil => "NIL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Range(..) => "RANGE",
            Value::Return(_) => "RETURN",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// Truthiness: only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// The user-facing rendering of this value.
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    /// Build a string value.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(text.as_ref()))
    }

    /// Build an array value from an iterator of elements.
    pub fn array(elements: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(elements.into_iter().collect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Range(a1, a2), Value::Range(b1, b2)) => a1 == b1 && a2 == b2,
            (Value::Return(a), Value::Return(b)) => a == b,
            // Functions and closures compare by identity.
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Nil => write!(f, "nil"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Range(start, end) => write!(f, "[{}..{}]", start, end),
            Value::Return(inner) => write!(f, "{}", inner),
            Value::Function(func) => {
                let params: Vec<String> =
                    func.parameters.iter().map(|p| p.to_string()).collect();
                write!(f, "fn({}) {{\n{}\n}}", params.join(", "), func.body)
            }
            Value::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
            Value::Closure(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
            Value::Builtin(_) => write!(f, "builtin function"),
        }
    }
}
