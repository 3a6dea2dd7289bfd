//! PostgreSQL dialect.

use super::{
    BatchUpdate, ConcatOperator, DialectDescriptor, DialectKind, LimitSyntax, MultiRowInsert,
    UpsertKind,
};

pub(super) const POSTGRESQL: DialectDescriptor = DialectDescriptor {
    kind: DialectKind::PostgreSql,
    name: "postgresql",
    identifier_open: '"',
    identifier_close: '"',
    parameter_prefix: '@',
    supports_limit_offset: true,
    limit_syntax: LimitSyntax::LimitOffset,
    paging_requires_order_by: false,
    concat_operator: ConcatOperator::DoublePipe,
    upsert_kind: UpsertKind::OnConflict,
    length_function: "LENGTH",
    max_parameters: 65_535,
    max_rows_per_insert: None,
    multi_row_insert: MultiRowInsert::ValuesList,
    batch_update: BatchUpdate::CaseExpression,
    dummy_table: None,
    table_alias_as: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        assert_eq!(POSTGRESQL.quote_identifier("Name"), "\"Name\"");
        assert_eq!(POSTGRESQL.upsert_kind, UpsertKind::OnConflict);
        assert_eq!(POSTGRESQL.limit_syntax, LimitSyntax::LimitOffset);
    }
}
