use num_bigint::BigInt;
use thiserror::Error;

/// Typed errors produced during evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },
    #[error("Function '{name}/{arity}' is not defined")]
    UndefinedFunction { name: String, arity: usize },
    #[error("Expected a value of type {expected}, received {received}")]
    UnexpectedType {
        expected: &'static str,
        received: &'static str,
    },
    #[error("Invalid operand types {left} and {right} for '{op}'")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Cannot assign to immutable variable '{name}'")]
    ImmutableAssignment { name: String },
    #[error("Only variables can be assigned to")]
    InvalidAssignmentReceiver,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: BigInt, len: usize },
    #[error("Exponent {exponent} out of range")]
    ExponentOutOfRange { exponent: BigInt },
}
