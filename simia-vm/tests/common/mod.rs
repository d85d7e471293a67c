// simia-vm - Common test utilities
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Shared helpers for compiler and VM integration tests.

pub use simia_core::{Value, eval_program};
pub use simia_parser::Parser;
pub use simia_vm::{Bytecode, Compiler, Vm};

use simia_parser::ast::Program;

/// Parse a source string, failing the test on parse errors.
#[allow(dead_code)]
pub fn parse(source: &str) -> Program {
    let mut parser = Parser::from_source(source);
    let program = parser.parse_program();
    assert!(
        parser.errors().is_empty(),
        "parser errors for {:?}: {:?}",
        source,
        parser.errors()
    );
    program
}

/// Compile a source string, failing the test on compile errors.
#[allow(dead_code)]
pub fn compile(source: &str) -> Bytecode {
    let program = parse(source);
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile error");
    compiler.bytecode()
}

/// Compile and run a source string on the VM, returning the last popped
/// value or the error message.
pub fn run_vm(source: &str) -> Result<Value, String> {
    let program = parse(source);
    let mut compiler = Compiler::new();
    compiler.compile(&program).map_err(|e| e.to_string())?;

    let mut vm = Vm::new(compiler.bytecode());
    vm.run().map_err(|e| e.to_string())?;
    Ok(vm.last_popped().clone())
}

/// Run a source string through the tree-walking evaluator, for parity
/// comparisons against the VM.
#[allow(dead_code)]
pub fn run_eval(source: &str) -> Result<Value, String> {
    let program = parse(source);
    let env = simia_core::Env::new();
    eval_program(&program, &env).map_err(|e| e.to_string())
}
