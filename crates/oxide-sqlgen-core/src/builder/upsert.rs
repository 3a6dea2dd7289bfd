//! Upsert (insert-or-update) statements for each dialect's upsert form.

use tracing::debug;

use crate::compiler::SqlFragment;
use crate::dialect::{DialectDescriptor, DialectKind, UpsertKind};
use crate::error::ClauseError;
use crate::statement::{Parameter, ParameterizedStatement};

use super::clause::column_list;

/// Builds a single-row upsert keyed on `key_columns`.
///
/// Non-key columns are updated when the key already exists. When every
/// column is a key column the statement only inserts missing rows.
///
/// # Errors
///
/// `UpsertNotSupported` for dialects without an upsert form,
/// `MissingKeyColumns` when the keys are empty or not part of `columns`,
/// plus the errors of [`super::build_insert`].
pub fn build_upsert(
    dialect: &DialectDescriptor,
    table: &str,
    columns: &[String],
    key_columns: &[String],
    values: Vec<SqlFragment>,
    parameters: Vec<Parameter>,
) -> Result<ParameterizedStatement, ClauseError> {
    if dialect.upsert_kind == UpsertKind::Unsupported {
        return Err(ClauseError::UpsertNotSupported(dialect.name));
    }
    if table.trim().is_empty() {
        return Err(ClauseError::MissingTable);
    }
    if columns.is_empty() {
        return Err(ClauseError::EmptyInsert);
    }
    if key_columns.is_empty() || key_columns.iter().any(|k| !columns.contains(k)) {
        return Err(ClauseError::MissingKeyColumns);
    }
    if values.len() != columns.len() {
        return Err(ClauseError::RowWidthMismatch {
            row: 0,
            expected: columns.len(),
            found: values.len(),
        });
    }

    let table_sql = dialect.quote_qualified(table.trim());
    let values: Vec<String> = values.into_iter().map(SqlFragment::into_sql).collect();
    let updates: Vec<&String> = columns.iter().filter(|c| !key_columns.contains(c)).collect();
    let q = |c: &str| dialect.quote_identifier(c);

    let sql = match dialect.upsert_kind {
        UpsertKind::OnConflict => {
            let action = if updates.is_empty() {
                String::from("DO NOTHING")
            } else {
                let set: Vec<String> = updates
                    .iter()
                    .map(|c| format!("{} = EXCLUDED.{}", q(c), q(c)))
                    .collect();
                format!("DO UPDATE SET {}", set.join(", "))
            };
            format!(
                "INSERT INTO {table_sql} ({}) VALUES ({}) ON CONFLICT ({}) {action}",
                column_list(dialect, columns),
                values.join(", "),
                column_list(dialect, key_columns),
            )
        }
        UpsertKind::OnDuplicateKey => {
            // MySQL has no DO NOTHING; a self-assignment of a key is a no-op.
            let set: Vec<String> = if updates.is_empty() {
                vec![format!("{} = {}", q(&key_columns[0]), q(&key_columns[0]))]
            } else {
                updates
                    .iter()
                    .map(|c| format!("{} = VALUES({})", q(c), q(c)))
                    .collect()
            };
            format!(
                "INSERT INTO {table_sql} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {}",
                column_list(dialect, columns),
                values.join(", "),
                set.join(", "),
            )
        }
        UpsertKind::Merge => merge(dialect, &table_sql, columns, key_columns, &updates, &values),
        UpsertKind::Unsupported => return Err(ClauseError::UpsertNotSupported(dialect.name)),
    };

    debug!(shape = "upsert", table, parameters = parameters.len(), "built statement");
    Ok(ParameterizedStatement::new(sql, parameters))
}

fn merge(
    dialect: &DialectDescriptor,
    table_sql: &str,
    columns: &[String],
    key_columns: &[String],
    updates: &[&String],
    values: &[String],
) -> String {
    let q = |c: &str| dialect.quote_identifier(c);

    let source: Vec<String> = columns
        .iter()
        .zip(values)
        .map(|(c, v)| format!("{v} AS {}", q(c)))
        .collect();
    let on: Vec<String> = key_columns
        .iter()
        .map(|k| format!("target.{} = source.{}", q(k), q(k)))
        .collect();
    let inserted: Vec<String> = columns.iter().map(|c| format!("source.{}", q(c))).collect();

    let mut sql = format!(
        "MERGE INTO {table_sql}{} USING (SELECT {}{}){} ON ({})",
        dialect.table_alias("target"),
        source.join(", "),
        dialect.dummy_from(),
        dialect.table_alias("source"),
        on.join(" AND "),
    );
    if !updates.is_empty() {
        let set: Vec<String> = updates
            .iter()
            .map(|c| format!("target.{} = source.{}", q(c), q(c)))
            .collect();
        sql.push_str(&format!(" WHEN MATCHED THEN UPDATE SET {}", set.join(", ")));
    }
    sql.push_str(&format!(
        " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
        column_list(dialect, columns),
        inserted.join(", ")
    ));
    // SQL Server requires MERGE to be terminated.
    if dialect.kind == DialectKind::SqlServer {
        sql.push(';');
    }
    sql
}
