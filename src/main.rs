// simia - A small dynamically-typed expression language written in Rust
// Copyright (c) 2025 The Simia Authors. MIT licensed.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use simia_core::builtins::BUILTINS;
use simia_core::{Env, Value, eval_program};
use simia_parser::Parser;
use simia_vm::{Compiler, GLOBALS_SIZE, SymbolTable, Vm};

const PROMPT: &str = ">> ";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Simia v{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.len() > 1 {
        run_files(&args[1..]);
    } else {
        run_repl();
    }
}

/// Evaluate a sequence of source files with the tree-walking evaluator.
fn run_files(files: &[String]) {
    let env = Env::new();
    for file in files {
        if let Err(message) = eval_file(file, &env) {
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

/// Evaluate a single source file.
fn eval_file(file: &str, env: &Env) -> Result<(), String> {
    let path = Path::new(file);
    match path.extension().and_then(|e| e.to_str()) {
        Some("simia") => {}
        Some(ext) => {
            return Err(format!(
                "error: unsupported file extension '.{}' for '{}'",
                ext, file
            ));
        }
        None => {
            return Err(format!(
                "error: file '{}' has no extension (expected .simia)",
                file
            ));
        }
    }

    let source =
        fs::read_to_string(path).map_err(|e| format!("error reading '{}': {}", file, e))?;

    let mut parser = Parser::from_source(&source);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        let rendered: Vec<String> = parser.errors().iter().map(|e| e.to_string()).collect();
        return Err(format!("parse errors in '{}':\n{}", file, rendered.join("\n")));
    }

    eval_program(&program, env)
        .map(|_| ())
        .map_err(|e| format!("error in '{}': {}", file, e))
}

/// The interactive REPL: parser → compiler → VM per line, with the symbol
/// table, constants pool and globals array persisting across lines.
fn run_repl() {
    println!("Simia v{}", env!("CARGO_PKG_VERSION"));

    let mut symbols = SymbolTable::new();
    for (index, builtin) in BUILTINS.iter().enumerate() {
        symbols.define_builtin(index, builtin.name);
    }
    let mut constants: Vec<Value> = Vec::new();
    let mut globals = vec![Value::Nil; GLOBALS_SIZE];

    loop {
        print!("{}", PROMPT);
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(error) => {
                eprintln!("read error: {}", error);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parser = Parser::from_source(line);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            for error in parser.errors() {
                println!("\t{}", error);
            }
            continue;
        }

        // Compile, then recover the symbol table and constants whether or
        // not compilation succeeded, so a failed line does not lose state.
        let mut compiler = Compiler::with_state(symbols, constants);
        let compiled = compiler.compile(&program);
        let bytecode = compiler.bytecode();
        (symbols, constants) = compiler.into_state();

        if let Err(error) = compiled {
            println!("compilation error:\n {}", error);
            continue;
        }

        let mut vm = Vm::with_global_store(bytecode, globals);
        match vm.run() {
            Ok(()) => {
                println!("{}", vm.last_popped().inspect());
            }
            Err(error) => {
                println!("bytecode execution error:\n {}", error);
            }
        }
        globals = vm.into_globals();
    }
}
