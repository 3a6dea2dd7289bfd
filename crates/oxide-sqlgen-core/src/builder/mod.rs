//! Statement builders.
//!
//! Fluent builders ([`Select`], [`Insert`], [`Update`], [`Delete`]) compile
//! expression trees against an [`EntityContext`](crate::schema::EntityContext)
//! and hand the fragments to the clause assemblers in this module. The
//! assemblers are public so callers holding precompiled fragments can use
//! them directly.
//!
//! # Example
//!
//! ```rust
//! use oxide_sqlgen_core::ast::Expr;
//! use oxide_sqlgen_core::builder::Select;
//! use oxide_sqlgen_core::dialect::{get, DialectKind};
//! use oxide_sqlgen_core::schema::EntityContext;
//!
//! let users = EntityContext::new("users");
//! let stmt = Select::new(&users)
//!     .filter(Expr::member("age").gt(Expr::lit(18)))
//!     .build(get(DialectKind::PostgreSql))
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "SELECT * FROM \"users\" WHERE \"age\" > @p0");
//! ```

mod batch;
mod clause;
mod delete;
mod insert;
mod select;
mod update;
mod upsert;

pub use batch::{build_batch_delete, build_batch_insert, build_batch_update, finish_batch, Row};
pub use clause::{
    build_delete, build_insert, build_select, build_update, Assignment, OrderDirection,
    OrderTerm, Projection, ProjectionItem, SelectClauses,
};
pub use delete::Delete;
pub use insert::{HasValues, Insert, NoValues};
pub use select::Select;
pub use update::{HasSet, NoSet, Update};
pub use upsert::build_upsert;
