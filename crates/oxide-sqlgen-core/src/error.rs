//! Error types for compilation, templating, clause assembly and batches.

use crate::value::ValueKind;

/// Errors raised while translating an expression tree into SQL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslationError {
    /// The tree cannot be translated as given.
    #[error("Malformed {node} expression: {reason}")]
    MalformedExpression {
        /// Kind of the offending node.
        node: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A method or operator outside the supported set.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Operand kinds that cannot be combined by the operation.
    #[error("Type mismatch in {op}: {left} vs {right}")]
    TypeMismatch {
        /// The operation being translated.
        op: &'static str,
        /// Kind of the left (or only) operand.
        left: ValueKind,
        /// Kind of the right operand.
        right: ValueKind,
    },
}

impl TranslationError {
    pub(crate) fn malformed(node: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedExpression {
            node,
            reason: reason.into(),
        }
    }
}

/// Errors raised while parsing or executing a SQL template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder has no entry in the parameter source.
    #[error("Unbound placeholder: {{{{{0}}}}}")]
    UnboundPlaceholder(String),

    /// `{{` without a matching `}}`.
    #[error("Unterminated placeholder starting at byte {offset}")]
    UnterminatedPlaceholder {
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// `{{}}` with nothing inside.
    #[error("Empty placeholder at byte {offset}")]
    EmptyPlaceholder {
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// Placeholder content that is not an identifier.
    #[error("Invalid placeholder '{name}' at byte {offset}")]
    InvalidPlaceholder {
        /// The text found between the braces.
        name: String,
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// A placeholder written between single quotes.
    #[error("Placeholder '{name}' at byte {offset} is inside a string literal")]
    PlaceholderInLiteral {
        /// The placeholder name.
        name: String,
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// A record-like parameter source that does not serialize to an object.
    #[error("Invalid parameter source: {0}")]
    InvalidSource(String),
}

/// Errors raised while assembling a statement from compiled clauses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClauseError {
    /// UPDATE without any SET assignment.
    #[error("UPDATE requires at least one assignment")]
    EmptyUpdate,

    /// Statement without a table name.
    #[error("Statement requires a table name")]
    MissingTable,

    /// INSERT without any column.
    #[error("INSERT requires at least one column")]
    EmptyInsert,

    /// A row whose width differs from the column list.
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidthMismatch {
        /// Zero-based row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },

    /// Keyed statement without usable key columns.
    #[error("Statement requires key columns that are part of the column list")]
    MissingKeyColumns,

    /// Paging with an offset on a dialect that can only limit.
    #[error("Dialect {0} does not support OFFSET")]
    OffsetNotSupported(&'static str),

    /// A single row binds more parameters than one statement may carry.
    #[error("Rows bind {per_row} parameters each, dialect allows {max} per statement")]
    TooManyParameters {
        /// Parameters bound per row.
        per_row: usize,
        /// The dialect's parameter ceiling.
        max: usize,
    },

    /// Upsert on a dialect without an upsert form.
    #[error("Dialect {0} does not support upserts")]
    UpsertNotSupported(&'static str),

    /// An expression handed to a builder failed to compile.
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

/// A chunk failure reported by the external execution layer.
pub type ExecutionError = Box<dyn std::error::Error + Send + Sync>;

/// A failure recorded for one chunk of a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Chunk {chunk_index} ({rows} rows) failed: {message}")]
pub struct BatchError {
    /// Zero-based chunk index.
    pub chunk_index: usize,
    /// Number of rows in the chunk.
    pub rows: usize,
    /// Rendered underlying error.
    pub message: String,
}

/// Result type for translation.
pub type Result<T> = std::result::Result<T, TranslationError>;
