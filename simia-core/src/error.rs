// simia-core - Error types for the Simia runtime
// Copyright (c) 2025 The Simia Authors. MIT licensed.

//! Runtime error types shared by the evaluator and the virtual machine.
//!
//! The rendered message strings are stable and part of the language's
//! observable contract; tests assert on them verbatim.
//!
//! # Examples
//!
//! ```
//! use simia_core::Error;
//!
//! let err = Error::type_mismatch("INTEGER", "+", "BOOLEAN");
//! assert_eq!(err.to_string(), "type mismatch: INTEGER + BOOLEAN");
//!
//! let err = Error::IdentifierNotFound("foobar".to_string());
//! assert_eq!(err.to_string(), "identifier not found: foobar");
//! ```

use std::fmt;

/// Result type for Simia evaluation and VM execution.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running Simia code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Infix operands of different types.
    TypeMismatch {
        left: &'static str,
        operator: String,
        right: &'static str,
    },
    /// Prefix operator applied to an unsupported operand.
    UnknownPrefixOperator {
        operator: String,
        right: &'static str,
    },
    /// Infix operator unsupported for its (same-typed) operands.
    UnknownInfixOperator {
        left: &'static str,
        operator: String,
        right: &'static str,
    },
    /// Unresolved name.
    IdentifierNotFound(String),
    /// Assignment to a name with no existing binding.
    UndeclaredAssignment(String),
    /// The evaluator called a value that is not callable.
    NotAFunction(&'static str),
    /// The VM called a value that is neither a closure nor a builtin.
    CallingNonFunction,
    /// A closure was called with the wrong number of arguments.
    WrongArity { want: usize, got: usize },
    /// A builtin was called with the wrong number of arguments.
    BuiltinArity { got: usize, want: usize },
    /// A builtin rejected an argument; carries the full rendered message.
    BuiltinArgument(String),
    /// Index applied to a non-indexable receiver.
    IndexNotSupported(&'static str),
    /// Hash key of a non-string type.
    KeyNotString(&'static str),
    /// Range with identical bounds.
    EmptyRange { start: i64, end: i64 },
    /// `for … in` over a non-iterable value.
    ForIterable(&'static str),
    /// The evaluator's loop-iteration guard tripped.
    LoopLimit,
    /// Integer division by zero.
    DivisionByZero,
    /// Value-stack or call-stack exhaustion in the VM.
    StackOverflow,
    /// The right operand of `|>` was not a call expression.
    PipelineTarget,
    /// Invariant violation inside the VM.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch {
                left,
                operator,
                right,
            } => {
                write!(f, "type mismatch: {} {} {}", left, operator, right)
            }
            Error::UnknownPrefixOperator { operator, right } => {
                write!(f, "unknown operator: {}{}", operator, right)
            }
            Error::UnknownInfixOperator {
                left,
                operator,
                right,
            } => {
                write!(f, "unknown operator: {} {} {}", left, operator, right)
            }
            Error::IdentifierNotFound(name) => {
                write!(f, "identifier not found: {}", name)
            }
            Error::UndeclaredAssignment(name) => {
                write!(f, "error assigning undeclared variable \"{}\"", name)
            }
            Error::NotAFunction(kind) => {
                write!(f, "not a function: {}", kind)
            }
            Error::CallingNonFunction => {
                write!(f, "calling non-function")
            }
            Error::WrongArity { want, got } => {
                write!(f, "wrong number of arguments: want={}, got={}", want, got)
            }
            Error::BuiltinArity { got, want } => {
                write!(f, "wrong number of arguments. got={}, want={}", got, want)
            }
            Error::BuiltinArgument(message) => {
                write!(f, "{}", message)
            }
            Error::IndexNotSupported(kind) => {
                write!(f, "index operator not supported: {}", kind)
            }
            Error::KeyNotString(kind) => {
                write!(f, "key is not string: {}", kind)
            }
            Error::EmptyRange { start, end } => {
                write!(
                    f,
                    "range start and end must be different: {}..{}",
                    start, end
                )
            }
            Error::ForIterable(kind) => {
                write!(f, "for-loop not supported for type {}", kind)
            }
            Error::LoopLimit => {
                write!(f, "max loop call exceed")
            }
            Error::DivisionByZero => {
                write!(f, "division by zero")
            }
            Error::StackOverflow => {
                write!(f, "stack overflow")
            }
            Error::PipelineTarget => {
                write!(f, "expected function call in pipeline expression")
            }
            Error::Internal(message) => {
                write!(f, "internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a type-mismatch error.
    pub fn type_mismatch(left: &'static str, operator: impl Into<String>, right: &'static str) -> Self {
        Error::TypeMismatch {
            left,
            operator: operator.into(),
            right,
        }
    }

    /// Create an unknown-prefix-operator error.
    pub fn unknown_prefix(operator: impl Into<String>, right: &'static str) -> Self {
        Error::UnknownPrefixOperator {
            operator: operator.into(),
            right,
        }
    }

    /// Create an unknown-infix-operator error.
    pub fn unknown_infix(left: &'static str, operator: impl Into<String>, right: &'static str) -> Self {
        Error::UnknownInfixOperator {
            left,
            operator: operator.into(),
            right,
        }
    }

    /// Create a builtin argument error with a fully rendered message.
    pub fn builtin_argument(message: impl Into<String>) -> Self {
        Error::BuiltinArgument(message.into())
    }

    /// Create an internal VM error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}
