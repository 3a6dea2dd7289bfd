//! Oracle dialect (12c and later, for OFFSET/FETCH).

use super::{
    BatchUpdate, ConcatOperator, DialectDescriptor, DialectKind, LimitSyntax, MultiRowInsert,
    UpsertKind,
};

pub(super) const ORACLE: DialectDescriptor = DialectDescriptor {
    kind: DialectKind::Oracle,
    name: "oracle",
    identifier_open: '"',
    identifier_close: '"',
    parameter_prefix: ':',
    supports_limit_offset: true,
    limit_syntax: LimitSyntax::OffsetFetch,
    paging_requires_order_by: false,
    concat_operator: ConcatOperator::DoublePipe,
    upsert_kind: UpsertKind::Merge,
    length_function: "LENGTH",
    max_parameters: 65_535,
    max_rows_per_insert: None,
    multi_row_insert: MultiRowInsert::InsertAll,
    batch_update: BatchUpdate::PlSqlBlock,
    dummy_table: Some("DUAL"),
    table_alias_as: false,
};
