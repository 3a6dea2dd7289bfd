//! Multi-row statement shapes used by the batch executor.
//!
//! Every value is bound through the supplied [`CompileContext`]; nothing is
//! inlined into the SQL text.

use tracing::debug;

use crate::compiler::CompileContext;
use crate::dialect::{BatchUpdate, DialectDescriptor, MultiRowInsert};
use crate::error::ClauseError;
use crate::statement::ParameterizedStatement;
use crate::value::TypedValue;

use super::clause::column_list;

/// One row of values, positionally aligned with a column list.
pub type Row = Vec<TypedValue>;

fn check_shape(table: &str, columns: &[String], rows: &[Row]) -> Result<(), ClauseError> {
    if table.trim().is_empty() {
        return Err(ClauseError::MissingTable);
    }
    if columns.is_empty() {
        return Err(ClauseError::EmptyInsert);
    }
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(ClauseError::RowWidthMismatch {
                row: index,
                expected: columns.len(),
                found: row.len(),
            });
        }
    }
    Ok(())
}

fn key_positions(columns: &[String], key_columns: &[String]) -> Result<Vec<usize>, ClauseError> {
    if key_columns.is_empty() {
        return Err(ClauseError::MissingKeyColumns);
    }
    key_columns
        .iter()
        .map(|k| {
            columns
                .iter()
                .position(|c| c == k)
                .ok_or(ClauseError::MissingKeyColumns)
        })
        .collect()
}

fn bind_row(dialect: &DialectDescriptor, ctx: &mut CompileContext<'_>, row: &[TypedValue]) -> String {
    row.iter()
        .map(|value| dialect.parameter_marker(&ctx.bind(value.clone())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds one INSERT covering all `rows`.
///
/// # Errors
///
/// `MissingTable`, `EmptyInsert` or `RowWidthMismatch` for malformed input.
pub fn build_batch_insert(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    table: &str,
    columns: &[String],
    rows: &[Row],
) -> Result<String, ClauseError> {
    check_shape(table, columns, rows)?;
    if rows.is_empty() {
        return Err(ClauseError::EmptyInsert);
    }

    let quoted = dialect.quote_qualified(table.trim());
    let column_sql = column_list(dialect, columns);

    let sql = match dialect.multi_row_insert {
        MultiRowInsert::ValuesList => {
            let tuples: Vec<String> = rows
                .iter()
                .map(|row| format!("({})", bind_row(dialect, ctx, row)))
                .collect();
            format!("INSERT INTO {quoted} ({column_sql}) VALUES {}", tuples.join(", "))
        }
        MultiRowInsert::InsertAll => {
            let mut sql = String::from("INSERT ALL");
            for row in rows {
                sql.push_str(&format!(
                    " INTO {quoted} ({column_sql}) VALUES ({})",
                    bind_row(dialect, ctx, row)
                ));
            }
            sql.push_str(&format!(" SELECT 1{}", dialect.dummy_from()));
            sql
        }
    };

    debug!(shape = "batch insert", table, rows = rows.len(), "built statement");
    Ok(sql)
}

/// Builds the keyed UPDATE for all `rows` in the dialect's batch form.
///
/// Non-key columns are assigned; key columns identify each row. A NULL key
/// value matches with `IS NULL`. Depending on
/// [`DialectDescriptor::batch_update`] the result is one UPDATE per row
/// joined with `; `, the same wrapped in a PL/SQL block, or one UPDATE whose
/// assignments pick each row's value with `CASE WHEN`.
///
/// # Errors
///
/// `MissingKeyColumns` when the keys are empty or absent from `columns`,
/// `EmptyUpdate` when every column is a key, plus shape errors.
pub fn build_batch_update(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    table: &str,
    columns: &[String],
    key_columns: &[String],
    rows: &[Row],
) -> Result<String, ClauseError> {
    check_shape(table, columns, rows)?;
    let keys = key_positions(columns, key_columns)?;
    let set_positions: Vec<usize> = (0..columns.len()).filter(|i| !keys.contains(i)).collect();
    if set_positions.is_empty() {
        return Err(ClauseError::EmptyUpdate);
    }

    let quoted = dialect.quote_qualified(table.trim());
    let sql = match dialect.batch_update {
        BatchUpdate::Statements => {
            row_updates(dialect, ctx, &quoted, columns, &keys, &set_positions, rows).join("; ")
        }
        BatchUpdate::PlSqlBlock => {
            let statements =
                row_updates(dialect, ctx, &quoted, columns, &keys, &set_positions, rows);
            format!("BEGIN {}; END;", statements.join("; "))
        }
        BatchUpdate::CaseExpression => {
            case_update(dialect, ctx, &quoted, columns, &keys, &set_positions, rows)
        }
    };

    debug!(shape = "batch update", table, rows = rows.len(), "built statement");
    Ok(sql)
}

fn row_updates(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    quoted: &str,
    columns: &[String],
    keys: &[usize],
    set_positions: &[usize],
    rows: &[Row],
) -> Vec<String> {
    rows.iter()
        .map(|row| {
            let set: Vec<String> = set_positions
                .iter()
                .map(|&i| {
                    let name = ctx.bind(row[i].clone());
                    format!(
                        "{} = {}",
                        dialect.quote_identifier(&columns[i]),
                        dialect.parameter_marker(&name)
                    )
                })
                .collect();
            let predicate = key_conjunction(dialect, ctx, columns, keys, row);
            format!("UPDATE {quoted} SET {} WHERE {predicate}", set.join(", "))
        })
        .collect()
}

/// Each row's key condition is bound once, on first use, and its markers
/// are reused by every assignment and by the WHERE clause.
fn case_update(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    quoted: &str,
    columns: &[String],
    keys: &[usize],
    set_positions: &[usize],
    rows: &[Row],
) -> String {
    let mut conditions: Vec<Option<String>> = vec![None; rows.len()];
    let mut assignments = Vec::with_capacity(set_positions.len());

    for &i in set_positions {
        let column = dialect.quote_identifier(&columns[i]);
        let mut arms = String::new();
        for (condition, row) in conditions.iter_mut().zip(rows) {
            let condition = condition
                .get_or_insert_with(|| key_conjunction(dialect, ctx, columns, keys, row))
                .clone();
            let value = dialect.parameter_marker(&ctx.bind(row[i].clone()));
            arms.push_str(&format!(" WHEN {condition} THEN {value}"));
        }
        assignments.push(format!("{column} = CASE{arms} ELSE {column} END"));
    }

    let predicate = conditions
        .iter()
        .flatten()
        .map(|c| format!("({c})"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!(
        "UPDATE {quoted} SET {} WHERE {predicate}",
        assignments.join(", ")
    )
}

fn key_conjunction(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    columns: &[String],
    keys: &[usize],
    row: &[TypedValue],
) -> String {
    keys.iter()
        .map(|&i| {
            let column = dialect.quote_identifier(&columns[i]);
            if row[i].is_null() {
                format!("{column} IS NULL")
            } else {
                let name = ctx.bind(row[i].clone());
                format!("{column} = {}", dialect.parameter_marker(&name))
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Builds one DELETE removing every row identified by its key values.
///
/// A single key column produces `k IN (..)`, with `k IS NULL` added for
/// NULL key values; composite keys produce an `OR` of parenthesized
/// conjunctions.
///
/// # Errors
///
/// `MissingKeyColumns` when the keys are empty or absent from `columns`,
/// plus shape errors.
pub fn build_batch_delete(
    dialect: &DialectDescriptor,
    ctx: &mut CompileContext<'_>,
    table: &str,
    columns: &[String],
    key_columns: &[String],
    rows: &[Row],
) -> Result<String, ClauseError> {
    check_shape(table, columns, rows)?;
    let keys = key_positions(columns, key_columns)?;
    let quoted = dialect.quote_qualified(table.trim());

    let predicate = if rows.is_empty() {
        // Matches nothing.
        String::from("1 = 0")
    } else if let [key] = keys.as_slice() {
        let column = dialect.quote_identifier(&columns[*key]);
        let markers: Vec<String> = rows
            .iter()
            .filter(|row| !row[*key].is_null())
            .map(|row| dialect.parameter_marker(&ctx.bind(row[*key].clone())))
            .collect();
        let has_null = markers.len() < rows.len();
        match (markers.is_empty(), has_null) {
            (true, _) => format!("{column} IS NULL"),
            (false, false) => format!("{column} IN ({})", markers.join(", ")),
            (false, true) => format!(
                "({column} IN ({}) OR {column} IS NULL)",
                markers.join(", ")
            ),
        }
    } else {
        rows.iter()
            .map(|row| format!("({})", key_conjunction(dialect, ctx, columns, &keys, row)))
            .collect::<Vec<_>>()
            .join(" OR ")
    };

    debug!(shape = "batch delete", table, rows = rows.len(), "built statement");
    Ok(format!("DELETE FROM {quoted} WHERE {predicate}"))
}

/// Wraps batch SQL and the context's parameters into a statement.
#[must_use]
pub fn finish_batch(sql: String, ctx: CompileContext<'_>) -> ParameterizedStatement {
    ParameterizedStatement::new(sql, ctx.into_parameters())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{get, DialectKind};
    use crate::schema::EntityContext;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| String::from(*s)).collect()
    }

    fn rows() -> Vec<Row> {
        vec![
            vec![TypedValue::Int(1), TypedValue::String(String::from("a"))],
            vec![TypedValue::Int(2), TypedValue::String(String::from("b"))],
        ]
    }

    #[test]
    fn test_values_list_insert() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_insert(
            get(DialectKind::PostgreSql),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &rows(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"id\", \"name\") VALUES (@p0, @p1), (@p2, @p3)"
        );
        assert_eq!(ctx.parameters().len(), 4);
    }

    #[test]
    fn test_insert_all_oracle() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_insert(
            get(DialectKind::Oracle),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &rows(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sql,
            "INSERT ALL INTO \"t\" (\"id\", \"name\") VALUES (:p0, :p1) \
             INTO \"t\" (\"id\", \"name\") VALUES (:p2, :p3) SELECT 1 FROM DUAL"
        );
    }

    #[test]
    fn test_row_width_mismatch() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let bad = vec![vec![TypedValue::Int(1)]];
        let result = build_batch_insert(
            get(DialectKind::Sqlite),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &bad,
        );
        assert_eq!(
            result,
            Err(ClauseError::RowWidthMismatch {
                row: 0,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_keyed_update() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_update(
            get(DialectKind::SqlServer),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &cols(&["id"]),
            &rows(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sql,
            "UPDATE [t] SET [name] = @p0 WHERE [id] = @p1; UPDATE [t] SET [name] = @p2 WHERE [id] = @p3"
        );
    }

    fn update_sql(kind: DialectKind, keys: &[&str], rows: &[Row]) -> String {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_update(
            get(kind),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &cols(keys),
            rows,
        )
        .unwrap_or_else(|e| panic!("{e}"));
        let stmt = finish_batch(sql, ctx);
        assert!(stmt.check_bindings(get(kind)).is_ok(), "{}", stmt.sql());
        String::from(stmt.sql())
    }

    #[test]
    fn test_keyed_update_oracle_block() {
        assert_eq!(
            update_sql(DialectKind::Oracle, &["id"], &rows()),
            "BEGIN UPDATE \"t\" SET \"name\" = :p0 WHERE \"id\" = :p1; \
             UPDATE \"t\" SET \"name\" = :p2 WHERE \"id\" = :p3; END;"
        );
    }

    #[test]
    fn test_keyed_update_single_statement() {
        let expected = [
            (
                DialectKind::PostgreSql,
                "UPDATE \"t\" SET \"name\" = CASE WHEN \"id\" = @p0 THEN @p1 \
                 WHEN \"id\" = @p2 THEN @p3 ELSE \"name\" END \
                 WHERE (\"id\" = @p0) OR (\"id\" = @p2)",
            ),
            (
                DialectKind::Sqlite,
                "UPDATE [t] SET [name] = CASE WHEN [id] = @p0 THEN @p1 \
                 WHEN [id] = @p2 THEN @p3 ELSE [name] END \
                 WHERE ([id] = @p0) OR ([id] = @p2)",
            ),
            (
                DialectKind::MySql,
                "UPDATE `t` SET `name` = CASE WHEN `id` = @p0 THEN @p1 \
                 WHEN `id` = @p2 THEN @p3 ELSE `name` END \
                 WHERE (`id` = @p0) OR (`id` = @p2)",
            ),
        ];
        for (kind, sql) in expected {
            let built = update_sql(kind, &["id"], &rows());
            assert_eq!(built, sql, "{kind:?}");
            assert!(!built.contains(';'));
        }
    }

    #[test]
    fn test_keyed_update_reuses_key_markers_across_columns() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let data = vec![vec![
            TypedValue::Int(1),
            TypedValue::String(String::from("a")),
            TypedValue::Bool(true),
        ]];
        let sql = build_batch_update(
            get(DialectKind::PostgreSql),
            &mut ctx,
            "t",
            &cols(&["id", "name", "active"]),
            &cols(&["id"]),
            &data,
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sql,
            "UPDATE \"t\" SET \"name\" = CASE WHEN \"id\" = @p0 THEN @p1 ELSE \"name\" END, \
             \"active\" = CASE WHEN \"id\" = @p0 THEN @p2 ELSE \"active\" END \
             WHERE (\"id\" = @p0)"
        );
        assert_eq!(ctx.parameters().len(), 3);
    }

    #[test]
    fn test_keyed_update_null_key() {
        let data = vec![vec![TypedValue::Null, TypedValue::String(String::from("a"))]];
        assert_eq!(
            update_sql(DialectKind::Sqlite, &["id"], &data),
            "UPDATE [t] SET [name] = CASE WHEN [id] IS NULL THEN @p0 ELSE [name] END \
             WHERE ([id] IS NULL)"
        );
        assert_eq!(
            update_sql(DialectKind::SqlServer, &["id"], &data),
            "UPDATE [t] SET [name] = @p0 WHERE [id] IS NULL"
        );
    }

    #[test]
    fn test_update_all_keys() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let result = build_batch_update(
            get(DialectKind::SqlServer),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &cols(&["id", "name"]),
            &rows(),
        );
        assert_eq!(result, Err(ClauseError::EmptyUpdate));
    }

    #[test]
    fn test_delete_single_key() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_delete(
            get(DialectKind::MySql),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &cols(&["id"]),
            &rows(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(sql, "DELETE FROM `t` WHERE `id` IN (@p0, @p1)");
    }

    #[test]
    fn test_delete_single_null_key() {
        let entity = EntityContext::new("t");
        let delete = |data: &[Row]| {
            let mut ctx = CompileContext::new(&entity);
            let sql = build_batch_delete(
                get(DialectKind::MySql),
                &mut ctx,
                "t",
                &cols(&["id", "name"]),
                &cols(&["id"]),
                data,
            )
            .unwrap_or_else(|e| panic!("{e}"));
            let stmt = finish_batch(sql, ctx);
            assert!(stmt.check_bindings(get(DialectKind::MySql)).is_ok());
            stmt
        };
        let name = || TypedValue::String(String::from("x"));

        let mixed = delete(&[
            vec![TypedValue::Int(1), name()],
            vec![TypedValue::Null, name()],
        ]);
        assert_eq!(
            mixed.sql(),
            "DELETE FROM `t` WHERE (`id` IN (@p0) OR `id` IS NULL)"
        );
        assert_eq!(mixed.parameters().len(), 1);

        let only_null = delete(&[vec![TypedValue::Null, name()]]);
        assert_eq!(only_null.sql(), "DELETE FROM `t` WHERE `id` IS NULL");
        assert!(only_null.parameters().is_empty());
    }

    #[test]
    fn test_delete_composite_key() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let sql = build_batch_delete(
            get(DialectKind::MySql),
            &mut ctx,
            "t",
            &cols(&["id", "name"]),
            &cols(&["id", "name"]),
            &rows(),
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            sql,
            "DELETE FROM `t` WHERE (`id` = @p0 AND `name` = @p1) OR (`id` = @p2 AND `name` = @p3)"
        );
    }

    #[test]
    fn test_missing_key_column() {
        let entity = EntityContext::new("t");
        let mut ctx = CompileContext::new(&entity);
        let result = build_batch_delete(
            get(DialectKind::MySql),
            &mut ctx,
            "t",
            &cols(&["id"]),
            &cols(&["uuid"]),
            &[vec![TypedValue::Int(1)]],
        );
        assert_eq!(result, Err(ClauseError::MissingKeyColumns));
    }
}
