//! SQL Server dialect.

use super::{
    BatchUpdate, ConcatOperator, DialectDescriptor, DialectKind, LimitSyntax, MultiRowInsert,
    UpsertKind,
};

pub(super) const SQL_SERVER: DialectDescriptor = DialectDescriptor {
    kind: DialectKind::SqlServer,
    name: "sqlserver",
    identifier_open: '[',
    identifier_close: ']',
    parameter_prefix: '@',
    supports_limit_offset: true,
    limit_syntax: LimitSyntax::OffsetFetch,
    paging_requires_order_by: true,
    concat_operator: ConcatOperator::PlusOperator,
    upsert_kind: UpsertKind::Merge,
    length_function: "LEN",
    // 2100 including the implicit RPC parameters; stay one below.
    max_parameters: 2099,
    max_rows_per_insert: Some(1000),
    multi_row_insert: MultiRowInsert::ValuesList,
    batch_update: BatchUpdate::Statements,
    dummy_table: None,
    table_alias_as: true,
};
