//! SQL dialect descriptors.
//!
//! Different databases have slightly different SQL syntax. Each supported
//! dialect is described by an immutable [`DialectDescriptor`]; the five
//! built-in descriptors live in a registry that is initialized once and then
//! shared by reference.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

use std::sync::LazyLock;

use tracing::debug;

/// The closed set of built-in dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    SqlServer,
    MySql,
    PostgreSql,
    Oracle,
    Sqlite,
}

impl DialectKind {
    /// All built-in dialects, in registry order.
    pub const ALL: [Self; 5] = [
        Self::SqlServer,
        Self::MySql,
        Self::PostgreSql,
        Self::Oracle,
        Self::Sqlite,
    ];

    const fn index(self) -> usize {
        match self {
            Self::SqlServer => 0,
            Self::MySql => 1,
            Self::PostgreSql => 2,
            Self::Oracle => 3,
            Self::Sqlite => 4,
        }
    }
}

/// How LIMIT/OFFSET paging is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSyntax {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
    /// `SELECT TOP (n) ...`
    TopN,
}

/// How string concatenation is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatOperator {
    /// `a || b`
    DoublePipe,
    /// `CONCAT(a, b)`
    ConcatFunction,
    /// `a + b`
    PlusOperator,
}

/// Which upsert form the dialect offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    /// `INSERT ... ON CONFLICT (...) DO UPDATE SET ...`
    OnConflict,
    /// `INSERT ... ON DUPLICATE KEY UPDATE ...`
    OnDuplicateKey,
    /// `MERGE INTO ... USING ...`
    Merge,
    Unsupported,
}

/// How several rows are inserted by one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiRowInsert {
    /// `INSERT INTO t (..) VALUES (..), (..)`
    ValuesList,
    /// `INSERT ALL INTO t (..) VALUES (..) ... SELECT 1 FROM DUAL`
    InsertAll,
}

/// How one chunk of keyed row updates becomes a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchUpdate {
    /// `UPDATE ..; UPDATE ..` sent as one batch.
    Statements,
    /// `BEGIN UPDATE ..; UPDATE ..; END;`
    PlSqlBlock,
    /// One `UPDATE .. SET c = CASE WHEN <key> THEN .. END WHERE <keys>`.
    CaseExpression,
}

/// Lexical conventions of one SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectDescriptor {
    pub kind: DialectKind,
    pub name: &'static str,
    pub identifier_open: char,
    pub identifier_close: char,
    pub parameter_prefix: char,
    pub supports_limit_offset: bool,
    pub limit_syntax: LimitSyntax,
    /// SQL Server refuses OFFSET/FETCH without ORDER BY.
    pub paging_requires_order_by: bool,
    pub concat_operator: ConcatOperator,
    pub upsert_kind: UpsertKind,
    pub length_function: &'static str,
    /// Maximum number of bound parameters in one statement.
    pub max_parameters: usize,
    /// Maximum number of rows in one multi-row VALUES list.
    pub max_rows_per_insert: Option<usize>,
    pub multi_row_insert: MultiRowInsert,
    pub batch_update: BatchUpdate,
    /// Table to select from when a SELECT has no table (`DUAL`).
    pub dummy_table: Option<&'static str>,
    /// Whether table aliases may be introduced with `AS`.
    pub table_alias_as: bool,
}

impl DialectDescriptor {
    /// Returns whether `name` is already wrapped in this dialect's quotes.
    #[must_use]
    pub fn is_quoted(&self, name: &str) -> bool {
        name.len() >= 2
            && name.starts_with(self.identifier_open)
            && name.ends_with(self.identifier_close)
    }

    /// Quotes a single identifier.
    ///
    /// Closing quote characters inside the name are doubled. A name that is
    /// already quoted is returned unchanged.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        if self.is_quoted(name) {
            return String::from(name);
        }
        let close = self.identifier_close;
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(self.identifier_open);
        for c in name.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }

    /// Quotes each dot-separated part of a qualified name (`schema.table`).
    #[must_use]
    pub fn quote_qualified(&self, name: &str) -> String {
        if self.is_quoted(name) {
            return String::from(name);
        }
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Returns the marker that binds the parameter `name`, e.g. `@p0`.
    #[must_use]
    pub fn parameter_marker(&self, name: &str) -> String {
        format!("{}{name}", self.parameter_prefix)
    }

    /// Concatenates SQL operands using the dialect's syntax.
    #[must_use]
    pub fn concat(&self, parts: &[&str]) -> String {
        match self.concat_operator {
            ConcatOperator::DoublePipe => format!("({})", parts.join(" || ")),
            ConcatOperator::PlusOperator => format!("({})", parts.join(" + ")),
            ConcatOperator::ConcatFunction => format!("CONCAT({})", parts.join(", ")),
        }
    }

    /// Returns the alias clause for a table, e.g. ` AS src` or ` src`.
    #[must_use]
    pub fn table_alias(&self, alias: &str) -> String {
        if self.table_alias_as {
            format!(" AS {alias}")
        } else {
            format!(" {alias}")
        }
    }

    /// Returns the FROM clause needed by a table-less SELECT, if any.
    #[must_use]
    pub fn dummy_from(&self) -> String {
        self.dummy_table
            .map_or_else(String::new, |table| format!(" FROM {table}"))
    }
}

/// Read-only registry of the built-in dialect descriptors.
#[derive(Debug)]
pub struct DialectRegistry {
    descriptors: [DialectDescriptor; 5],
}

static REGISTRY: LazyLock<DialectRegistry> = LazyLock::new(|| {
    debug!("initializing dialect registry");
    DialectRegistry {
        descriptors: [
            sqlserver::SQL_SERVER,
            mysql::MYSQL,
            postgres::POSTGRESQL,
            oracle::ORACLE,
            sqlite::SQLITE,
        ],
    }
});

impl DialectRegistry {
    /// Returns the process-wide registry, building it on first access.
    #[must_use]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Returns the descriptor for `kind`.
    #[must_use]
    pub const fn get(&self, kind: DialectKind) -> &DialectDescriptor {
        &self.descriptors[kind.index()]
    }

    /// Iterates over all descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &DialectDescriptor> {
        self.descriptors.iter()
    }
}

/// Returns the shared descriptor for `kind`.
#[must_use]
pub fn get(kind: DialectKind) -> &'static DialectDescriptor {
    DialectRegistry::global().get(kind)
}
