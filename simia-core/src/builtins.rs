// simia-core - Built-in functions for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! The built-in function table.
//!
//! [`BUILTINS`] is a fixed, ordered list; the order is part of the bytecode
//! contract because `GetBuiltin` indexes into it. The evaluator resolves
//! builtins by name after the environment chain misses.

use crate::error::{Error, Result};
use crate::value::{Builtin, Value};

/// The ordered builtin table. Do not reorder entries: compiled bytecode
/// refers to them by index.
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: builtin_len,
    },
    Builtin {
        name: "log",
        func: builtin_log,
    },
    Builtin {
        name: "append",
        func: builtin_append,
    },
];

/// Look up a builtin by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

/// `len(x)` — byte length of a string or element count of an array.
fn builtin_len(args: &[Value]) -> Result<Value> {
    if args.len() != 1 {
        return Err(Error::BuiltinArity {
            got: args.len(),
            want: 1,
        });
    }

    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.len() as i64)),
        Value::Array(elements) => Ok(Value::Int(elements.len() as i64)),
        other => Err(Error::builtin_argument(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        ))),
    }
}

/// `log(args…)` — write each argument's rendering to stdout on its own line.
fn builtin_log(args: &[Value]) -> Result<Value> {
    for arg in args {
        println!("{}", arg.inspect());
    }
    Ok(Value::Nil)
}

/// `append(array, value)` — a new array with `value` appended; the original
/// is untouched.
fn builtin_append(args: &[Value]) -> Result<Value> {
    if args.len() != 2 {
        return Err(Error::BuiltinArity {
            got: args.len(),
            want: 2,
        });
    }

    match &args[0] {
        Value::Array(elements) => {
            let mut appended = elements.clone();
            appended.push_back(args[1].clone());
            Ok(Value::Array(appended))
        }
        other => Err(Error::builtin_argument(format!(
            "argument to `append` must be ARRAY, got {}",
            other.type_name()
        ))),
    }
}
