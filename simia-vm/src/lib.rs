// simia-vm - Bytecode compiler and virtual machine for the Simia programming language
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Bytecode compiler and stack-based virtual machine for Simia.
//!
//! This crate provides an alternative execution model to the AST-walking
//! interpreter in `simia-core`. Code is compiled to bytecode in a single
//! pass, then executed by a stack machine with call frames and closures.
//!
//! ```
//! use simia_parser::Parser;
//! use simia_vm::{Compiler, Vm};
//!
//! let mut parser = Parser::from_source("let a = 2; a * 21");
//! let program = parser.parse_program();
//! assert!(parser.errors().is_empty());
//!
//! let mut compiler = Compiler::new();
//! compiler.compile(&program).unwrap();
//!
//! let mut vm = Vm::new(compiler.bytecode());
//! vm.run().unwrap();
//! assert_eq!(vm.last_popped().inspect(), "42");
//! ```

pub mod compiler;
pub mod symbol_table;
pub mod vm;

pub use compiler::{Bytecode, CompileError, Compiler};
pub use symbol_table::{Symbol, SymbolScope, SymbolTable};
pub use vm::{GLOBALS_SIZE, Vm};
