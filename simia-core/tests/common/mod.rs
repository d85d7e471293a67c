// simia-core - Common test utilities
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Shared helpers for Simia evaluator integration tests.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

pub use simia_core::{Env, Value, eval_program};
pub use simia_parser::Parser;

/// Evaluate a source string in a fresh environment.
///
/// Returns the evaluated value, or the error message string.
pub fn run(source: &str) -> Result<Value, String> {
    let env = Env::new();
    run_with_env(source, &env)
}

/// Evaluate a source string in the given environment.
pub fn run_with_env(source: &str, env: &Env) -> Result<Value, String> {
    let mut parser = Parser::from_source(source);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        let rendered: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        return Err(rendered.join("\n"));
    }
    eval_program(&program, env).map_err(|e| e.to_string())
}

/// Evaluate a source string and return the result's `inspect()` form.
#[allow(dead_code)]
pub fn run_inspect(source: &str) -> Result<String, String> {
    run(source).map(|value| value.inspect())
}

/// Assert that `input` evaluates to the expected value.
#[macro_export]
macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = $crate::common::run($input);
        assert!(
            result.is_ok(),
            "failed to evaluate {:?}: {:?}",
            $input,
            result.err()
        );
        assert_eq!(result.unwrap(), $expected, "evaluating {:?}", $input);
    };
}

/// Assert that `input` fails with exactly the expected error message.
#[macro_export]
macro_rules! assert_eval_err {
    ($input:expr, $message:expr) => {
        let result = $crate::common::run($input);
        assert!(
            result.is_err(),
            "expected error for {:?} but got {:?}",
            $input,
            result.ok()
        );
        assert_eq!(result.unwrap_err(), $message, "evaluating {:?}", $input);
    };
}
