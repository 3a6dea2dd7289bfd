//! Statement assembly from compiled clauses.
//!
//! One entry point per statement shape. Each takes fragments produced by
//! the compiler plus structural pieces (table, columns, ordering, paging)
//! and the parameters bound while compiling those fragments.

use tracing::debug;

use crate::compiler::SqlFragment;
use crate::dialect::{DialectDescriptor, LimitSyntax};
use crate::error::ClauseError;
use crate::statement::{Parameter, ParameterizedStatement};

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One compiled ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub sql: String,
    pub direction: OrderDirection,
}

/// One compiled projection item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionItem {
    pub sql: String,
    pub alias: Option<String>,
}

/// The SELECT list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// `COUNT(*)`
    Count,
    Items(Vec<ProjectionItem>),
}

/// Everything a SELECT needs besides its parameters.
#[derive(Debug, Clone, Default)]
pub struct SelectClauses {
    pub table: String,
    pub distinct: bool,
    pub projection: Projection,
    pub predicate: Option<SqlFragment>,
    pub order_by: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// One compiled SET assignment; `column` is an unquoted column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: String,
    pub value: SqlFragment,
}

fn require_table(dialect: &DialectDescriptor, table: &str) -> Result<String, ClauseError> {
    let trimmed = table.trim();
    if trimmed.is_empty() {
        return Err(ClauseError::MissingTable);
    }
    Ok(dialect.quote_qualified(trimmed))
}

/// Appends ` WHERE <predicate>` unless the predicate is absent or empty.
fn push_where(sql: &mut String, predicate: Option<&SqlFragment>) {
    if let Some(fragment) = predicate.filter(|f| !f.sql().trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(fragment.sql());
    }
}

fn finish(
    shape: &'static str,
    table: &str,
    sql: String,
    parameters: Vec<Parameter>,
) -> ParameterizedStatement {
    debug!(shape, table, parameters = parameters.len(), "built statement");
    ParameterizedStatement::new(sql, parameters)
}

/// Builds a SELECT statement.
///
/// # Errors
///
/// `MissingTable` for an empty table name, `OffsetNotSupported` for an
/// offset on a `TopN` dialect.
pub fn build_select(
    dialect: &DialectDescriptor,
    clauses: SelectClauses,
    parameters: Vec<Parameter>,
) -> Result<ParameterizedStatement, ClauseError> {
    let table = require_table(dialect, &clauses.table)?;
    let mut sql = String::from("SELECT ");

    if clauses.distinct {
        sql.push_str("DISTINCT ");
    }

    if dialect.limit_syntax == LimitSyntax::TopN {
        if clauses.offset.is_some() {
            return Err(ClauseError::OffsetNotSupported(dialect.name));
        }
        if let Some(n) = clauses.limit {
            sql.push_str(&format!("TOP ({n}) "));
        }
    }

    match &clauses.projection {
        Projection::All => sql.push('*'),
        Projection::Count => sql.push_str("COUNT(*)"),
        Projection::Items(items) if items.is_empty() => sql.push('*'),
        Projection::Items(items) => {
            let list: Vec<String> = items
                .iter()
                .map(|item| match &item.alias {
                    Some(alias) => format!("{} AS {}", item.sql, dialect.quote_identifier(alias)),
                    None => item.sql.clone(),
                })
                .collect();
            sql.push_str(&list.join(", "));
        }
    }

    sql.push_str(" FROM ");
    sql.push_str(&table);

    push_where(&mut sql, clauses.predicate.as_ref());

    if !clauses.order_by.is_empty() {
        let terms: Vec<String> = clauses
            .order_by
            .iter()
            .map(|term| format!("{} {}", term.sql, term.direction.as_str()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    push_paging(
        &mut sql,
        dialect,
        clauses.order_by.is_empty(),
        clauses.limit,
        clauses.offset,
    );

    Ok(finish("select", &clauses.table, sql, parameters))
}

fn push_paging(
    sql: &mut String,
    dialect: &DialectDescriptor,
    unordered: bool,
    limit: Option<u64>,
    offset: Option<u64>,
) {
    if limit.is_none() && offset.is_none() {
        return;
    }
    match dialect.limit_syntax {
        LimitSyntax::LimitOffset => {
            match (limit, offset) {
                (Some(n), _) => sql.push_str(&format!(" LIMIT {n}")),
                // OFFSET alone is not accepted everywhere; an unbounded
                // LIMIT is.
                (None, Some(_)) => sql.push_str(&format!(" LIMIT {}", i64::MAX)),
                (None, None) => {}
            }
            if let Some(m) = offset {
                sql.push_str(&format!(" OFFSET {m}"));
            }
        }
        LimitSyntax::OffsetFetch => {
            if unordered && dialect.paging_requires_order_by {
                sql.push_str(" ORDER BY (SELECT NULL)");
            }
            sql.push_str(&format!(" OFFSET {} ROWS", offset.unwrap_or(0)));
            if let Some(n) = limit {
                sql.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
            }
        }
        LimitSyntax::TopN => {}
    }
}

/// Builds an UPDATE statement.
///
/// # Errors
///
/// `EmptyUpdate` when `assignments` is empty, `MissingTable` for an empty
/// table name.
pub fn build_update(
    dialect: &DialectDescriptor,
    table: &str,
    assignments: Vec<Assignment>,
    predicate: Option<SqlFragment>,
    parameters: Vec<Parameter>,
) -> Result<ParameterizedStatement, ClauseError> {
    let quoted = require_table(dialect, table)?;
    if assignments.is_empty() {
        return Err(ClauseError::EmptyUpdate);
    }

    let set_parts: Vec<String> = assignments
        .iter()
        .map(|a| format!("{} = {}", dialect.quote_identifier(&a.column), a.value.sql()))
        .collect();

    let mut sql = format!("UPDATE {quoted} SET {}", set_parts.join(", "));
    push_where(&mut sql, predicate.as_ref());

    Ok(finish("update", table, sql, parameters))
}

/// Builds a DELETE statement.
///
/// **Warning**: without a predicate this deletes every row.
///
/// # Errors
///
/// `MissingTable` for an empty table name.
pub fn build_delete(
    dialect: &DialectDescriptor,
    table: &str,
    predicate: Option<SqlFragment>,
    parameters: Vec<Parameter>,
) -> Result<ParameterizedStatement, ClauseError> {
    let quoted = require_table(dialect, table)?;
    let mut sql = format!("DELETE FROM {quoted}");
    push_where(&mut sql, predicate.as_ref());
    Ok(finish("delete", table, sql, parameters))
}

/// Builds a single-row INSERT statement.
///
/// # Errors
///
/// `EmptyInsert` without columns, `RowWidthMismatch` when the number of
/// values differs from the number of columns, `MissingTable` for an empty
/// table name.
pub fn build_insert(
    dialect: &DialectDescriptor,
    table: &str,
    columns: &[String],
    values: Vec<SqlFragment>,
    parameters: Vec<Parameter>,
) -> Result<ParameterizedStatement, ClauseError> {
    let quoted = require_table(dialect, table)?;
    if columns.is_empty() {
        return Err(ClauseError::EmptyInsert);
    }
    if values.len() != columns.len() {
        return Err(ClauseError::RowWidthMismatch {
            row: 0,
            expected: columns.len(),
            found: values.len(),
        });
    }

    let values: Vec<String> = values.into_iter().map(SqlFragment::into_sql).collect();
    let sql = format!(
        "INSERT INTO {quoted} ({}) VALUES ({})",
        column_list(dialect, columns),
        values.join(", ")
    );
    Ok(finish("insert", table, sql, parameters))
}

pub(crate) fn column_list(dialect: &DialectDescriptor, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get, DialectKind};
    use crate::value::TypedValue;

    fn param(name: &str, value: TypedValue, position: u32) -> Parameter {
        Parameter {
            name: String::from(name),
            value,
            position,
        }
    }

    fn users() -> SelectClauses {
        SelectClauses {
            table: String::from("users"),
            ..SelectClauses::default()
        }
    }

    #[test]
    fn test_select_without_predicate_has_no_where() {
        let stmt = build_select(get(DialectKind::MySql), users(), vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "SELECT * FROM `users`");
    }

    #[test]
    fn test_empty_predicate_is_omitted() {
        let clauses = SelectClauses {
            predicate: Some(SqlFragment::condition("")),
            ..users()
        };
        let stmt = build_select(get(DialectKind::MySql), clauses, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(!stmt.sql().contains("WHERE"));
    }

    #[test]
    fn test_order_by_preserves_sequence() {
        let clauses = SelectClauses {
            order_by: vec![
                OrderTerm {
                    sql: String::from("[LastName]"),
                    direction: OrderDirection::Asc,
                },
                OrderTerm {
                    sql: String::from("[Age]"),
                    direction: OrderDirection::Desc,
                },
            ],
            ..users()
        };
        let stmt = build_select(get(DialectKind::Sqlite), clauses, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM [users] ORDER BY [LastName] ASC, [Age] DESC"
        );
    }

    #[test]
    fn test_limit_offset_per_dialect() {
        let paged = || SelectClauses {
            limit: Some(10),
            offset: Some(20),
            ..users()
        };
        let sql_for = |kind| {
            build_select(get(kind), paged(), vec![])
                .map(|s| String::from(s.sql()))
                .unwrap_or_else(|e| panic!("{e}"))
        };
        assert_eq!(
            sql_for(DialectKind::PostgreSql),
            "SELECT * FROM \"users\" LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            sql_for(DialectKind::SqlServer),
            "SELECT * FROM [users] ORDER BY (SELECT NULL) OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            sql_for(DialectKind::Oracle),
            "SELECT * FROM \"users\" OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let clauses = SelectClauses {
            offset: Some(5),
            ..users()
        };
        let stmt = build_select(get(DialectKind::Sqlite), clauses, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM [users] LIMIT 9223372036854775807 OFFSET 5"
        );
    }

    #[test]
    fn test_top_n_dialect() {
        let mut dialect = get(DialectKind::SqlServer).clone();
        dialect.limit_syntax = LimitSyntax::TopN;
        dialect.supports_limit_offset = false;

        let clauses = SelectClauses {
            limit: Some(5),
            distinct: true,
            ..users()
        };
        let stmt = build_select(&dialect, clauses, vec![]).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "SELECT DISTINCT TOP (5) * FROM [users]");

        let clauses = SelectClauses {
            offset: Some(5),
            ..users()
        };
        assert_eq!(
            build_select(&dialect, clauses, vec![]),
            Err(ClauseError::OffsetNotSupported("sqlserver"))
        );
    }

    #[test]
    fn test_projection_aliases_and_count() {
        let clauses = SelectClauses {
            projection: Projection::Items(vec![
                ProjectionItem {
                    sql: String::from("`id`"),
                    alias: None,
                },
                ProjectionItem {
                    sql: String::from("UPPER(`name`)"),
                    alias: Some(String::from("upper_name")),
                },
            ]),
            ..users()
        };
        let stmt = build_select(get(DialectKind::MySql), clauses, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "SELECT `id`, UPPER(`name`) AS `upper_name` FROM `users`"
        );

        let clauses = SelectClauses {
            projection: Projection::Count,
            ..users()
        };
        let stmt = build_select(get(DialectKind::MySql), clauses, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "SELECT COUNT(*) FROM `users`");
    }

    #[test]
    fn test_missing_table() {
        let clauses = SelectClauses::default();
        assert_eq!(
            build_select(get(DialectKind::MySql), clauses, vec![]),
            Err(ClauseError::MissingTable)
        );
        assert_eq!(
            build_delete(get(DialectKind::MySql), "  ", None, vec![]),
            Err(ClauseError::MissingTable)
        );
    }

    #[test]
    fn test_update_rejects_empty_assignments() {
        assert_eq!(
            build_update(get(DialectKind::PostgreSql), "users", vec![], None, vec![]),
            Err(ClauseError::EmptyUpdate)
        );
    }

    #[test]
    fn test_update_with_where() {
        let stmt = build_update(
            get(DialectKind::PostgreSql),
            "users",
            vec![Assignment {
                column: String::from("name"),
                value: SqlFragment::value("@p0", None),
            }],
            Some(SqlFragment::condition("\"id\" = @p1")),
            vec![
                param("p0", TypedValue::String(String::from("Bob")), 0),
                param("p1", TypedValue::Int(1), 1),
            ],
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "UPDATE \"users\" SET \"name\" = @p0 WHERE \"id\" = @p1"
        );
        assert_eq!(stmt.parameters().len(), 2);
    }

    #[test]
    fn test_delete_without_where() {
        let stmt = build_delete(get(DialectKind::SqlServer), "dbo.users", None, vec![])
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stmt.sql(), "DELETE FROM [dbo].[users]");
    }

    #[test]
    fn test_insert() {
        let columns = vec![String::from("id"), String::from("name")];
        let stmt = build_insert(
            get(DialectKind::Oracle),
            "users",
            &columns,
            vec![
                SqlFragment::value(":p0", None),
                SqlFragment::value(":p1", None),
            ],
            vec![
                param("p0", TypedValue::Int(1), 0),
                param("p1", TypedValue::String(String::from("Ann")), 1),
            ],
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"users\" (\"id\", \"name\") VALUES (:p0, :p1)"
        );
    }

    #[test]
    fn test_insert_width_mismatch() {
        let columns = vec![String::from("id"), String::from("name")];
        assert_eq!(
            build_insert(
                get(DialectKind::Oracle),
                "users",
                &columns,
                vec![SqlFragment::value(":p0", None)],
                vec![],
            ),
            Err(ClauseError::RowWidthMismatch {
                row: 0,
                expected: 2,
                found: 1
            })
        );
    }
}
