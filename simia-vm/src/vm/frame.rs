// simia-vm - Call frames for the Simia VM
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Call frames.

use std::rc::Rc;

use simia_bytecode::Instructions;
use simia_core::value::Closure;

/// One entry in the VM's call stack: the active closure, the instruction
/// pointer into its bytecode, and the stack position where its locals begin.
#[derive(Debug)]
pub struct Frame {
    pub closure: Rc<Closure>,
    pub ip: usize,
    pub base_pointer: usize,
}

impl Frame {
    /// Create a frame for a closure whose locals start at `base_pointer`.
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    /// The instruction stream this frame executes.
    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}
