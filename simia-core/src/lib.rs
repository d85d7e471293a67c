// simia-core - Runtime and evaluator for the Simia programming language
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! # simia-core
//!
//! Runtime values, lexical environments and the AST-walking evaluator for
//! the Simia programming language.
//!
//! # Quick Start
//!
//! ```
//! use simia_core::{Env, eval_program};
//! use simia_parser::Parser;
//!
//! let mut parser = Parser::from_source("let a = 2; a * 21");
//! let program = parser.parse_program();
//! assert!(parser.errors().is_empty());
//!
//! let env = Env::new();
//! let result = eval_program(&program, &env).unwrap();
//! assert_eq!(result.inspect(), "42");
//! ```
//!
//! # Core Components
//!
//! - [`Value`] - the tagged runtime value
//! - [`Env`] - lexical environment for variable bindings
//! - [`eval_program`] - evaluate a parsed program
//! - [`builtins::BUILTINS`] - the ordered table of native functions

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod value;

pub use env::Env;
pub use error::{Error, Result};
pub use eval::{apply_function, eval_program};
pub use value::{Builtin, Closure, CompiledFunction, Function, Value};
