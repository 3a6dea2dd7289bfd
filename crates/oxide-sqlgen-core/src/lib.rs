//! # oxide-sqlgen-core
//!
//! Compiles typed data-access expressions into parameterized SQL for
//! SQL Server, MySQL, PostgreSQL, Oracle and SQLite.
//!
//! This crate provides:
//! - An expression tree ([`ast`]) and a compiler ([`compiler`]) that turns it
//!   into dialect-correct SQL fragments with every literal bound as a named
//!   parameter
//! - Statement builders ([`builder`]) for SELECT, INSERT, UPDATE, DELETE,
//!   upserts and multi-row batch shapes
//! - A `{{name}}` template engine ([`template`]) for hand-written SQL
//! - A batch planner ([`batch`]) that chunks bulk writes under each
//!   dialect's parameter ceiling
//!
//! ## Building a query
//!
//! ```rust
//! use oxide_sqlgen_core::ast::Expr;
//! use oxide_sqlgen_core::builder::Select;
//! use oxide_sqlgen_core::dialect::{get, DialectKind};
//! use oxide_sqlgen_core::schema::{EntityContext, SnakeCase};
//!
//! let users = EntityContext::new("users").naming(SnakeCase);
//! let stmt = Select::new(&users)
//!     .filter(Expr::member("LastName").eq(Expr::lit("O'Brien")))
//!     .build(get(DialectKind::SqlServer))
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "SELECT * FROM [users] WHERE [last_name] = @p0");
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Literals never reach the SQL text; they are bound as parameters. Only
//! [`ParameterizedStatement::render`] inlines them, and its output is meant
//! for logs:
//!
//! ```rust
//! # use oxide_sqlgen_core::ast::Expr;
//! # use oxide_sqlgen_core::builder::Select;
//! # use oxide_sqlgen_core::dialect::{get, DialectKind};
//! # use oxide_sqlgen_core::schema::EntityContext;
//! let users = EntityContext::new("users");
//! let dialect = get(DialectKind::MySql);
//! let stmt = Select::new(&users)
//!     .filter(Expr::member("name").eq(Expr::lit("'; DROP TABLE users; --")))
//!     .build(dialect)
//!     .unwrap();
//!
//! assert_eq!(stmt.sql(), "SELECT * FROM `users` WHERE `name` = @p0");
//! assert_eq!(
//!     stmt.render(dialect),
//!     "SELECT * FROM `users` WHERE `name` = '''; DROP TABLE users; --'"
//! );
//! ```

pub mod ast;
pub mod batch;
pub mod builder;
pub mod compiler;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod statement;
pub mod template;
pub mod value;

pub use ast::{BinaryOp, Expr, MemberPath, Method, UnaryOp};
pub use batch::{
    execute_delete, execute_insert, execute_update, plan, BatchOptions, BatchPlan, BatchResult,
    CancellationFlag, ChunkExecutor,
};
pub use builder::{Delete, Insert, Select, Update};
pub use compiler::{compile, compile_predicate, CompileContext, SqlFragment};
pub use dialect::{DialectDescriptor, DialectKind, DialectRegistry};
pub use error::{BatchError, ClauseError, ExecutionError, TemplateError, TranslationError};
pub use schema::{AsDeclared, EntityContext, NamingStrategy, SnakeCase};
pub use statement::{BindingError, Parameter, ParameterizedStatement};
pub use template::{ParameterSource, Record, SqlTemplate};
pub use value::{ToTypedValue, TypedValue, ValueKind};
