// simia-vm - Bytecode compiler for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Single-pass AST → bytecode compiler.
//!
//! The compiler walks the AST once, maintaining a stack of compilation
//! scopes. Each scope owns an instruction buffer, the last two emitted
//! opcodes (for peephole edits such as dropping a trailing `Pop`) and a
//! nested symbol table. Constants are pooled flat across scopes.

use std::fmt;
use std::mem;
use std::rc::Rc;

use simia_bytecode::{Instructions, Opcode, make};
use simia_core::builtins::BUILTINS;
use simia_core::value::{CompiledFunction, Value};
use simia_parser::ast::{
    BlockStatement, Expression, FunctionLiteral, HashLiteral, InfixExpression, Program, Statement,
};

use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};

/// Placeholder operand for jump instructions awaiting backpatch.
const PENDING_JUMP: usize = 0xFFFF;

/// A compile error. Compilation stops at the first failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An identifier that resolves to nothing.
    UndefinedVariable(String),
    /// An operator with no lowering.
    UnknownOperator(String),
    /// The right operand of `|>` was not a call expression.
    PipelineTarget,
    /// `for … in` has no counterpart in the fixed opcode set.
    ForInNotSupported,
    /// Assignment to a name that is not a plain global or local.
    InvalidAssignment(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedVariable(name) => {
                write!(f, "undefined variable {}", name)
            }
            CompileError::UnknownOperator(op) => {
                write!(f, "unknown operator {}", op)
            }
            CompileError::PipelineTarget => {
                write!(f, "expected function call in pipeline expression")
            }
            CompileError::ForInNotSupported => {
                write!(f, "for-in loops are not supported by the bytecode compiler")
            }
            CompileError::InvalidAssignment(name) => {
                write!(f, "cannot assign to {}", name)
            }
        }
    }
}

impl std::error::Error for CompileError {}

type Result<T> = std::result::Result<T, CompileError>;

/// The compiler's output: the top-level instruction stream and the constant
/// pool it references.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

/// Per-function work area: instruction buffer plus peephole state.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// The Simia bytecode compiler.
pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
}

impl Compiler {
    /// Create a compiler with a fresh symbol table; builtins are
    /// pre-registered at their table ordinals.
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name);
        }
        Compiler::with_state(symbol_table, Vec::new())
    }

    /// Create a compiler that continues from existing REPL state: a symbol
    /// table and a constants pool carried over from previous lines.
    pub fn with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
        }
    }

    /// Compile a program into the current scope.
    pub fn compile(&mut self, program: &Program) -> Result<()> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The finished bytecode. The compiler can keep compiling afterwards.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.scopes[self.scope_index].instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Tear the compiler down into its persistent state, for the REPL to
    /// thread into the next line's compiler. If compilation failed inside a
    /// function scope, the table unwinds back to the global one.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        let mut table = self.symbol_table;
        while !table.is_global() {
            table = table
                .into_outer()
                .expect("non-global symbol table without an outer table");
        }
        (table, self.constants)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Expression(stmt) => {
                self.compile_expression(&stmt.expression)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            Statement::Let(stmt) => {
                // Defining before compiling the value lets the value
                // expression refer to the name being bound.
                let symbol = self.symbol_table.define(&stmt.name.value);
                self.compile_expression(&stmt.value)?;
                self.emit_store(&symbol);
                Ok(())
            }
            Statement::Return(stmt) => {
                match &stmt.value {
                    Some(value) => self.compile_expression(value)?,
                    None => {
                        self.emit(Opcode::Nil, &[]);
                    }
                }
                self.emit(Opcode::ReturnValue, &[]);
                Ok(())
            }
        }
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<()> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expression(&mut self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::Int(literal) => {
                let constant = self.add_constant(Value::Int(literal.value));
                self.emit(Opcode::Constant, &[constant]);
                Ok(())
            }
            Expression::Str(literal) => {
                let constant = self.add_constant(Value::string(&literal.value));
                self.emit(Opcode::Constant, &[constant]);
                Ok(())
            }
            Expression::Bool(literal) => {
                self.emit(if literal.value { Opcode::True } else { Opcode::False }, &[]);
                Ok(())
            }
            Expression::Ident(identifier) => {
                let symbol = self
                    .symbol_table
                    .resolve(&identifier.value)
                    .ok_or_else(|| CompileError::UndefinedVariable(identifier.value.clone()))?;
                self.load_symbol(&symbol);
                Ok(())
            }
            Expression::Prefix(prefix) => {
                self.compile_expression(&prefix.right)?;
                match prefix.operator.as_str() {
                    "!" => self.emit(Opcode::Bang, &[]),
                    "-" => self.emit(Opcode::Minus, &[]),
                    op => return Err(CompileError::UnknownOperator(op.to_string())),
                };
                Ok(())
            }
            Expression::Infix(infix) => self.compile_infix(infix),
            Expression::If(conditional) => {
                self.compile_expression(&conditional.condition)?;

                // Patched to the start of the alternative below.
                let jump_if_branch = self.emit(Opcode::JumpIfBranch, &[PENDING_JUMP]);
                self.compile_block(&conditional.consequence)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_pop();
                }

                let jump = self.emit(Opcode::Jump, &[PENDING_JUMP]);
                let after_consequence = self.current_instructions().len();
                self.change_operand(jump_if_branch, after_consequence);

                match &conditional.alternative {
                    None => {
                        // If-expressions have a value; a missing else is nil.
                        self.emit(Opcode::Nil, &[]);
                    }
                    Some(alternative) => {
                        self.compile_block(alternative)?;
                        if self.last_instruction_is(Opcode::Pop) {
                            self.remove_last_pop();
                        }
                    }
                }
                let after_alternative = self.current_instructions().len();
                self.change_operand(jump, after_alternative);
                Ok(())
            }
            Expression::For(looped) => {
                if matches!(looped.condition.as_ref(), Expression::In(_)) {
                    return Err(CompileError::ForInNotSupported);
                }

                let condition_position = self.current_instructions().len();
                self.compile_expression(&looped.condition)?;
                let exit_jump = self.emit(Opcode::JumpIfBranch, &[PENDING_JUMP]);

                // Loop bodies are statement lists, so they are stack-neutral
                // and can jump straight back to the condition.
                self.compile_block(&looped.body)?;
                self.emit(Opcode::Jump, &[condition_position]);

                let after_body = self.current_instructions().len();
                self.change_operand(exit_jump, after_body);

                // A for-expression evaluates to nil.
                self.emit(Opcode::Nil, &[]);
                Ok(())
            }
            Expression::In(_) => Err(CompileError::ForInNotSupported),
            Expression::Assign(assign) => {
                let symbol = self
                    .symbol_table
                    .resolve(&assign.identifier.value)
                    .ok_or_else(|| {
                        CompileError::UndefinedVariable(assign.identifier.value.clone())
                    })?;
                if !matches!(symbol.scope, SymbolScope::Global | SymbolScope::Local) {
                    return Err(CompileError::InvalidAssignment(
                        assign.identifier.value.clone(),
                    ));
                }

                self.compile_expression(&assign.value)?;
                self.emit_store(&symbol);
                // Assignments are expressions with value nil.
                self.emit(Opcode::Nil, &[]);
                Ok(())
            }
            Expression::Array(literal) => {
                for element in &literal.elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[literal.elements.len()]);
                Ok(())
            }
            Expression::Hash(literal) => self.compile_hash(literal),
            Expression::Index(index) => {
                self.compile_expression(&index.left)?;
                self.compile_expression(&index.index)?;
                self.emit(Opcode::Index, &[]);
                Ok(())
            }
            Expression::Function(literal) => self.compile_function(literal),
            Expression::Call(call) => {
                self.compile_expression(&call.function)?;
                for argument in &call.arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[call.arguments.len()]);
                Ok(())
            }
        }
    }

    fn compile_infix(&mut self, infix: &InfixExpression) -> Result<()> {
        match infix.operator.as_str() {
            // `x |> f(…)` compiles as `f(x, …)`.
            "|>" => {
                let Expression::Call(call) = infix.right.as_ref() else {
                    return Err(CompileError::PipelineTarget);
                };
                self.compile_expression(&call.function)?;
                self.compile_expression(&infix.left)?;
                for argument in &call.arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[call.arguments.len() + 1]);
                return Ok(());
            }
            // `<` is `>` with the operands swapped, so the VM carries a
            // single comparison opcode.
            "<" => {
                self.compile_expression(&infix.right)?;
                self.compile_expression(&infix.left)?;
                self.emit(Opcode::GreaterThan, &[]);
                return Ok(());
            }
            _ => {}
        }

        self.compile_expression(&infix.left)?;
        self.compile_expression(&infix.right)?;

        match infix.operator.as_str() {
            "+" => self.emit(Opcode::Add, &[]),
            "-" => self.emit(Opcode::Sub, &[]),
            "*" => self.emit(Opcode::Mul, &[]),
            "/" => self.emit(Opcode::Div, &[]),
            ">" => self.emit(Opcode::GreaterThan, &[]),
            "==" => self.emit(Opcode::Equal, &[]),
            "!=" => self.emit(Opcode::NotEqual, &[]),
            op => return Err(CompileError::UnknownOperator(op.to_string())),
        };
        Ok(())
    }

    fn compile_hash(&mut self, literal: &HashLiteral) -> Result<()> {
        // Sorting keys on their printed form makes the constant pool
        // deterministic; the runtime hash mapping is unordered regardless.
        let mut pairs: Vec<&(Expression, Expression)> = literal.pairs.iter().collect();
        pairs.sort_by_key(|(key, _)| key.to_string());

        for (key, value) in pairs {
            self.compile_expression(key)?;
            self.compile_expression(value)?;
        }
        self.emit(Opcode::Hash, &[literal.pairs.len() * 2]);
        Ok(())
    }

    fn compile_function(&mut self, literal: &FunctionLiteral) -> Result<()> {
        self.enter_scope();

        if let Some(name) = &literal.name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in &literal.parameters {
            self.symbol_table.define(&parameter.value);
        }

        self.compile_block(&literal.body)?;

        // An expression in tail position becomes the return value; a body
        // with no trailing value returns nil implicitly.
        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        // Free values are loaded in the enclosing scope so the Closure
        // instruction can capture them off the stack.
        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let function = Value::CompiledFunction(Rc::new(CompiledFunction {
            instructions,
            num_locals,
            num_parameters: literal.parameters.len(),
        }));
        let constant = self.add_constant(function);
        self.emit(Opcode::Closure, &[constant, free_symbols.len()]);
        Ok(())
    }

    // ========================================================================
    // Emission helpers
    // ========================================================================

    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let position = self.scopes[self.scope_index].instructions.append(instruction);

        let scope = &mut self.scopes[self.scope_index];
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction {
            opcode: op,
            position,
        });
        position
    }

    fn emit_store(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
            _ => self.emit(Opcode::SetLocal, &[symbol.index]),
        };
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        };
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn current_instructions(&self) -> &Instructions {
        &self.scopes[self.scope_index].instructions
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        match self.scopes[self.scope_index].last_instruction {
            Some(last) => last.opcode == op,
            None => false,
        }
    }

    fn remove_last_pop(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = scope.last_instruction {
            scope.instructions.0.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
            scope.previous_instruction = None;
        }
    }

    fn replace_last_pop_with_return(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = &mut scope.last_instruction {
            let position = last.position;
            let replacement = make(Opcode::ReturnValue, &[]);
            scope.instructions.0[position..position + replacement.len()]
                .copy_from_slice(&replacement);
            last.opcode = Opcode::ReturnValue;
        }
    }

    fn change_operand(&mut self, position: usize, operand: usize) {
        let scope = &mut self.scopes[self.scope_index];
        let op = Opcode::try_from(scope.instructions.0[position])
            .expect("patching a position that does not hold an opcode");
        let replacement = make(op, &[operand]);
        scope.instructions.0[position..position + replacement.len()]
            .copy_from_slice(&replacement);
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.scope_index += 1;
        let outer = mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("leaving the root scope");
        self.scope_index -= 1;
        let table = mem::take(&mut self.symbol_table);
        self.symbol_table = table
            .into_outer()
            .expect("leaving a scope with no enclosing symbol table");
        scope.instructions
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
