//! Tree-walking evaluator.
//!
//! Walks the parsed AST directly and performs its own dynamic checks, so
//! it stays independent of the analyzer. `print` output is collected in
//! the returned [`Evaluation`]; the binary writes it to stdout.

use crate::ast;
use crate::runtime::value::Value;

pub mod error;
mod runtime;

pub use error::RuntimeError;

use runtime::Evaluator;

/// The observable result of a run: the value returned by `main/0` and the
/// lines printed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub output: Vec<String>,
}

/// Evaluates a source: globals, then functions, then `main/0`.
pub fn evaluate(source: &ast::Source) -> Result<Evaluation, RuntimeError> {
    let mut evaluator = Evaluator::new();
    let value = evaluator.eval_source(source)?;
    Ok(Evaluation {
        value,
        output: evaluator.output,
    })
}
