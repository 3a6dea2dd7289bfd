//! Expression AST.
//!
//! Trees are produced by the caller (typically an annotation front-end),
//! consumed once by the compiler and then discarded.

mod expression;

pub use expression::{BinaryOp, Expr, MemberPath, Method, UnaryOp};
