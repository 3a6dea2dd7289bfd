//! SQLite dialect.

use super::{
    BatchUpdate, ConcatOperator, DialectDescriptor, DialectKind, LimitSyntax, MultiRowInsert,
    UpsertKind,
};

pub(super) const SQLITE: DialectDescriptor = DialectDescriptor {
    kind: DialectKind::Sqlite,
    name: "sqlite",
    identifier_open: '[',
    identifier_close: ']',
    parameter_prefix: '@',
    supports_limit_offset: true,
    limit_syntax: LimitSyntax::LimitOffset,
    paging_requires_order_by: false,
    concat_operator: ConcatOperator::DoublePipe,
    upsert_kind: UpsertKind::OnConflict,
    length_function: "LENGTH",
    // SQLITE_MAX_VARIABLE_NUMBER before 3.32.0.
    max_parameters: 999,
    max_rows_per_insert: None,
    multi_row_insert: MultiRowInsert::ValuesList,
    batch_update: BatchUpdate::CaseExpression,
    dummy_table: None,
    table_alias_as: true,
};
