// simia-vm - Stack-based virtual machine for Simia
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Stack-based virtual machine for executing Simia bytecode.
//!
//! The VM owns a fixed-size value stack addressed through a stack pointer
//! `sp` (next free slot) and a bounded frame stack. Arithmetic, comparison
//! and indexing mirror the evaluator's semantics; comparison on integers is
//! `>` only, since the compiler rewrites `<` with swapped operands.

pub mod frame;

use std::rc::Rc;

use im::{OrdMap, Vector};

use simia_bytecode::{Opcode, read_u8, read_u16};
use simia_core::builtins::BUILTINS;
use simia_core::error::{Error, Result};
use simia_core::value::{Builtin, Closure, CompiledFunction, Value};

use crate::compiler::Bytecode;

pub use frame::Frame;

/// Number of value-stack slots.
pub const STACK_SIZE: usize = 2048;
/// Number of global slots.
pub const GLOBALS_SIZE: usize = 65536;
/// Maximum call depth.
pub const MAX_FRAMES: usize = 1024;

/// The Simia virtual machine.
pub struct Vm {
    constants: Vec<Value>,
    globals: Vec<Value>,
    stack: Vec<Value>,
    /// Points to the next free stack slot; the top of stack is `sp - 1`.
    sp: usize,
    frames: Vec<Frame>,
}

impl Vm {
    /// Create a VM for a compiled program. The program's instructions are
    /// wrapped in a synthetic top-level closure with no captures.
    pub fn new(bytecode: Bytecode) -> Self {
        let main_fn = Rc::new(CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(Closure {
            func: main_fn,
            free: Vec::new(),
        });

        Vm {
            constants: bytecode.constants,
            globals: vec![Value::Nil; GLOBALS_SIZE],
            stack: vec![Value::Nil; STACK_SIZE],
            sp: 0,
            frames: vec![Frame::new(main_closure, 0)],
        }
    }

    /// Create a VM that reuses an existing globals array, as the REPL does
    /// across input lines.
    pub fn with_global_store(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let mut vm = Vm::new(bytecode);
        vm.globals = globals;
        vm
    }

    /// Recover the globals array for the next REPL line.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// The slot just above the current stack top: the value most recently
    /// popped. The REPL and tests use this to observe the final expression.
    pub fn last_popped(&self) -> &Value {
        &self.stack[self.sp]
    }

    /// Execute until the top-level instruction stream is exhausted.
    pub fn run(&mut self) -> Result<()> {
        while self.current_frame().ip < self.current_frame().instructions().len() {
            let op = {
                let frame = self.current_frame_mut();
                let byte = frame.closure.func.instructions.0[frame.ip];
                frame.ip += 1;
                Opcode::try_from(byte)
                    .map_err(|b| Error::internal(format!("unknown opcode {}", b)))?
            };

            match op {
                Opcode::Constant => {
                    let index = self.read_u16_operand();
                    let constant = self.constants[index].clone();
                    self.push(constant)?;
                }
                Opcode::Pop => {
                    self.pop();
                }

                Opcode::True => self.push(Value::Bool(true))?,
                Opcode::False => self.push(Value::Bool(false))?,
                Opcode::Nil => self.push(Value::Nil)?,

                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                    self.exec_binary_op(op)?;
                }
                Opcode::Equal | Opcode::NotEqual | Opcode::GreaterThan => {
                    self.exec_comparison(op)?;
                }
                Opcode::Bang => {
                    let operand = self.pop();
                    let result = match operand {
                        Value::Bool(b) => !b,
                        Value::Nil => true,
                        _ => false,
                    };
                    self.push(Value::Bool(result))?;
                }
                Opcode::Minus => {
                    let operand = self.pop();
                    match operand {
                        Value::Int(n) => self.push(Value::Int(-n))?,
                        other => {
                            return Err(Error::unknown_prefix("-", other.type_name()));
                        }
                    }
                }

                Opcode::Jump => {
                    let target = self.read_u16_operand();
                    self.current_frame_mut().ip = target;
                }
                Opcode::JumpIfBranch => {
                    let target = self.read_u16_operand();
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().ip = target;
                    }
                }

                Opcode::SetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.pop();
                    self.globals[index] = value;
                }
                Opcode::GetGlobal => {
                    let index = self.read_u16_operand();
                    let value = self.globals[index].clone();
                    self.push(value)?;
                }
                Opcode::SetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base_pointer;
                    let value = self.pop();
                    self.stack[base + index] = value;
                }
                Opcode::GetLocal => {
                    let index = self.read_u8_operand();
                    let base = self.current_frame().base_pointer;
                    let value = self.stack[base + index].clone();
                    self.push(value)?;
                }
                Opcode::GetBuiltin => {
                    let index = self.read_u8_operand();
                    self.push(Value::Builtin(BUILTINS[index]))?;
                }
                Opcode::GetFree => {
                    let index = self.read_u8_operand();
                    let value = self.current_frame().closure.free[index].clone();
                    self.push(value)?;
                }
                Opcode::CurrentClosure => {
                    let closure = Rc::clone(&self.current_frame().closure);
                    self.push(Value::Closure(closure))?;
                }

                Opcode::Array => {
                    let count = self.read_u16_operand();
                    let elements: Vector<Value> =
                        self.stack[self.sp - count..self.sp].iter().cloned().collect();
                    self.sp -= count;
                    self.push(Value::Array(elements))?;
                }
                Opcode::Hash => {
                    let count = self.read_u16_operand();
                    let hash = self.build_hash(self.sp - count, self.sp)?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                Opcode::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    let result = exec_index(left, index)?;
                    self.push(result)?;
                }

                Opcode::Call => {
                    let num_args = self.read_u8_operand();
                    self.call_function(num_args)?;
                }
                Opcode::ReturnValue => {
                    let value = self.pop();
                    if self.unwind_frame(value)? {
                        return Ok(());
                    }
                }
                Opcode::Return => {
                    if self.unwind_frame(Value::Nil)? {
                        return Ok(());
                    }
                }

                Opcode::Closure => {
                    let constant = self.read_u16_operand();
                    let free_count = self.read_u8_operand();
                    self.build_closure(constant, free_count)?;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("no active frame")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("no active frame")
    }

    fn read_u16_operand(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let value = read_u16(&frame.closure.func.instructions.0[frame.ip..]) as usize;
        frame.ip += 2;
        value
    }

    fn read_u8_operand(&mut self) -> usize {
        let frame = self.current_frame_mut();
        let value = read_u8(&frame.closure.func.instructions.0[frame.ip..]) as usize;
        frame.ip += 1;
        value
    }

    fn push(&mut self, value: Value) -> Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Error::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        debug_assert!(self.sp > 0, "stack underflow");
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    fn exec_binary_op(&mut self, op: Opcode) -> Result<()> {
        let right = self.pop();
        let left = self.pop();
        let symbol = binary_op_symbol(op);

        if left.type_name() != right.type_name() {
            return Err(Error::type_mismatch(
                left.type_name(),
                symbol,
                right.type_name(),
            ));
        }

        match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => {
                let result = match op {
                    Opcode::Add => l + r,
                    Opcode::Sub => l - r,
                    Opcode::Mul => l * r,
                    Opcode::Div => {
                        if *r == 0 {
                            return Err(Error::DivisionByZero);
                        }
                        l / r
                    }
                    _ => unreachable!(),
                };
                self.push(Value::Int(result))
            }
            (Value::Str(l), Value::Str(r)) => {
                if op == Opcode::Add {
                    self.push(Value::string(format!("{}{}", l, r)))
                } else {
                    Err(Error::unknown_infix("STRING", symbol, "STRING"))
                }
            }
            _ => Err(Error::unknown_infix(
                left.type_name(),
                symbol,
                right.type_name(),
            )),
        }
    }

    fn exec_comparison(&mut self, op: Opcode) -> Result<()> {
        let right = self.pop();
        let left = self.pop();
        let symbol = comparison_symbol(op);

        if left.type_name() != right.type_name() {
            return Err(Error::type_mismatch(
                left.type_name(),
                symbol,
                right.type_name(),
            ));
        }

        if let (Value::Int(l), Value::Int(r)) = (&left, &right) {
            let result = match op {
                Opcode::Equal => l == r,
                Opcode::NotEqual => l != r,
                Opcode::GreaterThan => l > r,
                _ => unreachable!(),
            };
            return self.push(Value::Bool(result));
        }

        match op {
            Opcode::Equal => self.push(Value::Bool(left == right)),
            Opcode::NotEqual => self.push(Value::Bool(left != right)),
            _ => Err(Error::unknown_infix(
                left.type_name(),
                symbol,
                right.type_name(),
            )),
        }
    }

    fn build_hash(&self, start: usize, end: usize) -> Result<Value> {
        let mut pairs = OrdMap::new();
        let mut i = start;
        while i < end {
            let key = match &self.stack[i] {
                Value::Str(s) => s.to_string(),
                other => return Err(Error::KeyNotString(other.type_name())),
            };
            pairs.insert(key, self.stack[i + 1].clone());
            i += 2;
        }
        Ok(Value::Hash(pairs))
    }

    fn build_closure(&mut self, constant: usize, free_count: usize) -> Result<()> {
        let func = match &self.constants[constant] {
            Value::CompiledFunction(func) => Rc::clone(func),
            other => return Err(Error::NotAFunction(other.type_name())),
        };

        let free = self.stack[self.sp - free_count..self.sp].to_vec();
        self.sp -= free_count;
        self.push(Value::Closure(Rc::new(Closure { func, free })))
    }

    /// Calling convention: the callee sits below its `num_args` arguments.
    fn call_function(&mut self, num_args: usize) -> Result<()> {
        let callee = self.stack[self.sp - 1 - num_args].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, num_args),
            Value::Builtin(builtin) => self.call_builtin(builtin, num_args),
            _ => Err(Error::CallingNonFunction),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, num_args: usize) -> Result<()> {
        if num_args != closure.func.num_parameters {
            return Err(Error::WrongArity {
                want: closure.func.num_parameters,
                got: num_args,
            });
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(Error::StackOverflow);
        }

        // Arguments occupy the first local slots; the rest are reserved by
        // bumping sp past the frame's local area.
        let base_pointer = self.sp - num_args;
        let reserved = base_pointer + closure.func.num_locals;
        if reserved > STACK_SIZE {
            return Err(Error::StackOverflow);
        }

        self.frames.push(Frame::new(closure, base_pointer));
        self.sp = reserved;
        Ok(())
    }

    fn call_builtin(&mut self, builtin: Builtin, num_args: usize) -> Result<()> {
        let arguments = self.stack[self.sp - num_args..self.sp].to_vec();
        let result = (builtin.func)(&arguments)?;
        self.sp -= num_args + 1;
        self.push(result)
    }

    /// Pop the current frame and push `value` as the call's result.
    /// Returns `true` when the popped frame was the top-level program,
    /// which ends execution.
    fn unwind_frame(&mut self, value: Value) -> Result<bool> {
        if self.frames.len() == 1 {
            // A top-level `return` ends the program; leave the value where
            // `last_popped` will find it.
            self.push(value)?;
            self.pop();
            return Ok(true);
        }

        let frame = self.frames.pop().expect("no active frame");
        // Discard the frame's locals and the callee slot.
        self.sp = frame.base_pointer - 1;
        self.push(value)?;
        Ok(false)
    }
}

fn binary_op_symbol(op: Opcode) -> &'static str {
    match op {
        Opcode::Add => "+",
        Opcode::Sub => "-",
        Opcode::Mul => "*",
        Opcode::Div => "/",
        _ => unreachable!(),
    }
}

fn comparison_symbol(op: Opcode) -> &'static str {
    match op {
        Opcode::Equal => "==",
        Opcode::NotEqual => "!=",
        Opcode::GreaterThan => ">",
        _ => unreachable!(),
    }
}

fn exec_index(left: Value, index: Value) -> Result<Value> {
    match (&left, &index) {
        (Value::Array(elements), Value::Int(i)) => {
            if *i < 0 || *i >= elements.len() as i64 {
                Ok(Value::Nil)
            } else {
                Ok(elements[*i as usize].clone())
            }
        }
        (Value::Hash(pairs), Value::Str(key)) => {
            Ok(pairs.get(key.as_ref()).cloned().unwrap_or(Value::Nil))
        }
        (Value::Hash(_), other) => Err(Error::KeyNotString(other.type_name())),
        _ => Err(Error::IndexNotSupported(left.type_name())),
    }
}
