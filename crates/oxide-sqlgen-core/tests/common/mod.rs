#![allow(dead_code)]

use oxide_sqlgen_core::ast::Expr;
use oxide_sqlgen_core::builder::Select;
use oxide_sqlgen_core::dialect::{get, DialectDescriptor, DialectKind};
use oxide_sqlgen_core::schema::{EntityContext, SnakeCase};
use oxide_sqlgen_core::ParameterizedStatement;

/// The `users` entity with snake_case columns and an `Id` key.
pub fn users() -> EntityContext {
    EntityContext::new("users").naming(SnakeCase).key("Id")
}

pub fn dialect(kind: DialectKind) -> &'static DialectDescriptor {
    get(kind)
}

/// Builds `SELECT * FROM users WHERE <predicate>` and checks the
/// marker/binding correspondence before returning it.
pub fn select_where(kind: DialectKind, predicate: Expr) -> ParameterizedStatement {
    let entity = users();
    let stmt = Select::new(&entity)
        .filter(predicate)
        .build(get(kind))
        .unwrap_or_else(|e| panic!("Failed to build for {kind:?}: {e}"));
    assert_bindings(&stmt, kind);
    stmt
}

/// Returns only the WHERE clause of a statement.
pub fn where_clause(stmt: &ParameterizedStatement) -> &str {
    stmt.sql()
        .split_once(" WHERE ")
        .map(|(_, predicate)| predicate)
        .unwrap_or_else(|| panic!("No WHERE clause in: {}", stmt.sql()))
}

pub fn assert_bindings(stmt: &ParameterizedStatement, kind: DialectKind) {
    if let Err(e) = stmt.check_bindings(get(kind)) {
        panic!("Binding mismatch for {kind:?}\n  SQL: {}\n  {e}", stmt.sql());
    }
}
