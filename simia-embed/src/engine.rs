// simia-embed - Engine implementation
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! The `Engine` struct and the `evaluate` entry point.

use std::fmt;

use simia_core::{Env, Error, Value, eval_program};
use simia_parser::{ParseError, Parser};

/// An error surfaced through the embedding interface.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedError {
    /// The source failed to parse; all accumulated parser errors.
    Parse(Vec<ParseError>),
    /// Evaluation failed.
    Runtime(Error),
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::Parse(errors) => {
                let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", rendered.join("\n"))
            }
            EmbedError::Runtime(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for EmbedError {}

/// The Simia scripting engine.
///
/// `Engine` keeps a single environment alive across `eval` calls, so
/// definitions persist the way they do in a long-running session.
///
/// `Engine` is not thread-safe: values and environments use `Rc`
/// internally. Create one engine per thread if you need concurrency.
///
/// # Example
///
/// ```
/// use simia_embed::Engine;
///
/// let engine = Engine::new();
/// engine.eval("let double = fn(x) { x * 2 };").unwrap();
/// let result = engine.eval("double(21)").unwrap();
/// assert_eq!(result.inspect(), "42");
/// ```
pub struct Engine {
    env: Env,
}

impl Engine {
    /// Create an engine with a fresh environment. Builtins are always
    /// reachable; they resolve after the environment chain misses.
    pub fn new() -> Self {
        Engine { env: Env::new() }
    }

    /// Evaluate a source string, returning the last expression's value.
    pub fn eval(&self, source: &str) -> Result<Value, EmbedError> {
        let mut parser = Parser::from_source(source);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(EmbedError::Parse(parser.errors().to_vec()));
        }
        eval_program(&program, &self.env).map_err(EmbedError::Runtime)
    }

    /// Bind a host value into the engine's environment.
    pub fn define(&self, name: &str, value: Value) {
        self.env.define(name, value);
    }

    /// Read a binding back out of the engine's environment.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.env.lookup(name)
    }

    /// Access the underlying environment.
    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a source string in a fresh environment and render the outcome:
/// the result's `inspect()` text on success, the last parse error on a
/// parse failure, or `ERROR: <message>` on a runtime failure.
pub fn evaluate(source: &str) -> String {
    let mut parser = Parser::from_source(source);
    let program = parser.parse_program();
    if let Some(error) = parser.errors().last() {
        return error.to_string();
    }

    let env = Env::new();
    match eval_program(&program, &env) {
        Ok(value) => value.inspect(),
        Err(error) => format!("ERROR: {}", error),
    }
}
