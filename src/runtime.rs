//! Shared runtime model: the closed set of built-in types, the runtime
//! value representation, and the lexical scope chain used by both the
//! analyzer and the interpreter.

pub mod scope;
pub mod types;
pub mod value;

pub use scope::{Scope, ScopeHandle};
pub use types::Type;
pub use value::Value;
