// simia-bytecode - Bytecode definitions for the Simia virtual machine
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! # simia-bytecode
//!
//! The Simia bytecode format: a linear byte buffer of instructions, each a
//! one-byte opcode followed by zero or more big-endian operands with fixed
//! per-opcode widths. This crate owns the opcode table, the encode/decode
//! helpers and the disassembler; the compiler and the VM build on it.

pub mod instructions;
pub mod opcode;

pub use instructions::{Instructions, read_operands, read_u8, read_u16};
pub use opcode::{Opcode, make};
