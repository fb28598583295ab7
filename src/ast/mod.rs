//! The AST data model: tagged expression/statement variants plus the
//! monotonic node id used to key the resolver's side-table (see
//! `crate::resolver`). Keying by an explicit id rather than node identity
//! (pointer address) survives moves and clones, which Rust AST nodes do
//! often.
mod expr;
mod stmt;

pub use expr::{Expr, LiteralValue};
pub use stmt::{FunctionDecl, Stmt};

/// Stable identity for an expression node, assigned once by the parser.
pub type NodeId = u32;
