//! MySQL dialect.
//!
//! Named `@` markers follow the MySqlConnector convention.

use super::{
    BatchUpdate, ConcatOperator, DialectDescriptor, DialectKind, LimitSyntax, MultiRowInsert,
    UpsertKind,
};

pub(super) const MYSQL: DialectDescriptor = DialectDescriptor {
    kind: DialectKind::MySql,
    name: "mysql",
    identifier_open: '`',
    identifier_close: '`',
    parameter_prefix: '@',
    supports_limit_offset: true,
    limit_syntax: LimitSyntax::LimitOffset,
    paging_requires_order_by: false,
    concat_operator: ConcatOperator::ConcatFunction,
    upsert_kind: UpsertKind::OnDuplicateKey,
    length_function: "LENGTH",
    max_parameters: 65_535,
    max_rows_per_insert: None,
    multi_row_insert: MultiRowInsert::ValuesList,
    batch_update: BatchUpdate::CaseExpression,
    dummy_table: None,
    table_alias_as: true,
};
