// simia-embed - Embedding interface for the Simia programming language
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! # simia-embed
//!
//! A high-level interface for running Simia from a host application:
//! [`Engine`] keeps an environment alive across evaluations, while
//! [`evaluate`] is the one-shot string-in/string-out entry point.
//!
//! ```
//! use simia_embed::evaluate;
//!
//! assert_eq!(evaluate("let a = [1, 2]; append(a, 3)"), "[1, 2, 3]");
//! assert_eq!(evaluate("missing"), "ERROR: identifier not found: missing");
//! ```

pub mod engine;

pub use engine::{EmbedError, Engine, evaluate};
