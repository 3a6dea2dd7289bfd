//! Batch planning and chunked execution of multi-row writes.
//!
//! A [`BatchPlan`] holds the rows of one bulk write and the requested chunk
//! size. The `execute_*` functions split the rows into chunks that respect
//! the dialect's parameter ceiling, build one statement per chunk and hand
//! it to a [`ChunkExecutor`]. Chunks run sequentially in row order.
//!
//! Prior successful chunks are never rolled back when a later one fails;
//! transactional scope belongs to the caller.

mod executor;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::builder::{
    build_batch_delete, build_batch_insert, build_batch_update, finish_batch, Row,
};
use crate::compiler::CompileContext;
use crate::dialect::DialectDescriptor;
use crate::error::{BatchError, ClauseError};
use crate::schema::EntityContext;

pub use executor::{CancellationFlag, ChunkExecutor};

/// Caller-facing batch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOptions {
    /// Requested rows per chunk; `None` picks one from the row count.
    pub chunk_size: Option<usize>,
    /// Pick the chunk size from the row count even when one was requested.
    /// The requested size still acts as an upper bound.
    pub auto_optimize: bool,
    /// Attempt every chunk even after a failure.
    pub continue_on_error: bool,
}

impl BatchOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Enables chunk size optimization.
    #[must_use]
    pub const fn auto_optimize(mut self, enabled: bool) -> Self {
        self.auto_optimize = enabled;
        self
    }

    /// Keeps going after a failed chunk.
    #[must_use]
    pub const fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }
}

/// Chunk size picked from the total row count.
#[must_use]
pub const fn optimal_chunk_size(row_count: usize) -> usize {
    match row_count {
        0..=1_000 => 100,
        1_001..=10_000 => 500,
        10_001..=100_000 => 1_000,
        _ => 2_000,
    }
}

/// A bulk write over one table.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    table: String,
    columns: Vec<String>,
    key_columns: Vec<String>,
    rows: Vec<Row>,
    chunk_size: usize,
    continue_on_error: bool,
    cancellation: Option<CancellationFlag>,
}

/// Plans a batch; `requested` of `None` picks the chunk size from the row
/// count.
///
/// # Errors
///
/// `MissingTable`, `EmptyInsert` for an empty column list, or
/// `RowWidthMismatch` for the first row whose width differs from `columns`.
pub fn plan(
    table: &str,
    columns: &[&str],
    rows: Vec<Row>,
    requested: Option<usize>,
) -> Result<BatchPlan, ClauseError> {
    let options = BatchOptions {
        chunk_size: requested,
        ..BatchOptions::default()
    };
    BatchPlan::with_options(table, columns, rows, &options)
}

impl BatchPlan {
    /// Plans a batch from explicit options.
    ///
    /// # Errors
    ///
    /// See [`plan`].
    pub fn with_options(
        table: &str,
        columns: &[&str],
        rows: Vec<Row>,
        options: &BatchOptions,
    ) -> Result<Self, ClauseError> {
        if table.trim().is_empty() {
            return Err(ClauseError::MissingTable);
        }
        if columns.is_empty() {
            return Err(ClauseError::EmptyInsert);
        }
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(ClauseError::RowWidthMismatch {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }

        let chunk_size = match options.chunk_size {
            Some(size) if !options.auto_optimize => size,
            Some(size) => optimal_chunk_size(rows.len()).min(size),
            None => optimal_chunk_size(rows.len()),
        }
        .max(1);

        debug!(table, rows = rows.len(), chunk_size, "planned batch");
        Ok(Self {
            table: String::from(table),
            columns: columns.iter().map(|c| String::from(*c)).collect(),
            key_columns: Vec::new(),
            rows,
            chunk_size,
            continue_on_error: options.continue_on_error,
            cancellation: None,
        })
    }

    /// Sets the key columns used by keyed updates and deletes.
    #[must_use]
    pub fn key_columns(mut self, keys: &[&str]) -> Self {
        self.key_columns = keys.iter().map(|k| String::from(*k)).collect();
        self
    }

    /// Sets whether failed chunks stop the batch.
    #[must_use]
    pub const fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Attaches a cancellation signal checked between chunks.
    #[must_use]
    pub fn cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the planned chunk size before any dialect ceiling applies.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the chunk size that fits `dialect`'s ceilings when each row
    /// binds `params_per_row` parameters. Multi-row inserts are also held
    /// to the dialect's row ceiling.
    ///
    /// # Errors
    ///
    /// `TooManyParameters` if a single row already exceeds the dialect's
    /// parameter ceiling.
    pub fn effective_chunk_size(
        &self,
        dialect: &DialectDescriptor,
        params_per_row: usize,
        multi_row_insert: bool,
    ) -> Result<usize, ClauseError> {
        if params_per_row > dialect.max_parameters {
            return Err(ClauseError::TooManyParameters {
                per_row: params_per_row,
                max: dialect.max_parameters,
            });
        }
        let mut size = self.chunk_size;
        if params_per_row > 0 {
            size = size.min(dialect.max_parameters / params_per_row);
        }
        if multi_row_insert {
            if let Some(max_rows) = dialect.max_rows_per_insert {
                size = size.min(max_rows);
            }
        }
        Ok(size.max(1))
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}

/// Outcome of one batch call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchResult {
    /// True when every attempted chunk succeeded and the batch was not
    /// cancelled.
    pub success: bool,
    /// Sum of rows reported by successful chunks.
    pub affected_rows: u64,
    /// Number of chunks attempted.
    pub batch_count: u32,
    /// Chunk size actually used.
    pub optimal_batch_size: usize,
    pub errors: Vec<BatchError>,
    pub elapsed: Duration,
    /// True when the cancellation flag stopped the batch early.
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Insert,
    Update,
    Delete,
}

impl Shape {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Inserts every row of `plan`, one multi-row INSERT per chunk.
///
/// # Errors
///
/// Clause errors for a malformed plan; chunk execution failures are
/// collected in [`BatchResult::errors`] instead.
pub fn execute_insert<E>(
    plan: &BatchPlan,
    dialect: &DialectDescriptor,
    executor: &mut E,
) -> Result<BatchResult, ClauseError>
where
    E: ChunkExecutor + ?Sized,
{
    run(plan, dialect, executor, Shape::Insert)
}

/// Updates every row of `plan` by its key columns.
///
/// # Errors
///
/// `MissingKeyColumns` or `EmptyUpdate` for unusable key columns.
pub fn execute_update<E>(
    plan: &BatchPlan,
    dialect: &DialectDescriptor,
    executor: &mut E,
) -> Result<BatchResult, ClauseError>
where
    E: ChunkExecutor + ?Sized,
{
    run(plan, dialect, executor, Shape::Update)
}

/// Deletes every row of `plan` by its key columns.
///
/// # Errors
///
/// `MissingKeyColumns` for unusable key columns.
pub fn execute_delete<E>(
    plan: &BatchPlan,
    dialect: &DialectDescriptor,
    executor: &mut E,
) -> Result<BatchResult, ClauseError>
where
    E: ChunkExecutor + ?Sized,
{
    run(plan, dialect, executor, Shape::Delete)
}

fn validate_keys(plan: &BatchPlan, shape: Shape) -> Result<(), ClauseError> {
    if matches!(shape, Shape::Insert) {
        return Ok(());
    }
    if plan.key_columns.is_empty() || plan.key_columns.iter().any(|k| !plan.columns.contains(k)) {
        return Err(ClauseError::MissingKeyColumns);
    }
    if matches!(shape, Shape::Update) && plan.key_columns.len() == plan.columns.len() {
        return Err(ClauseError::EmptyUpdate);
    }
    Ok(())
}

fn run<E>(
    plan: &BatchPlan,
    dialect: &DialectDescriptor,
    executor: &mut E,
    shape: Shape,
) -> Result<BatchResult, ClauseError>
where
    E: ChunkExecutor + ?Sized,
{
    let started = Instant::now();
    validate_keys(plan, shape)?;

    let params_per_row = match shape {
        Shape::Insert | Shape::Update => plan.columns.len(),
        Shape::Delete => plan.key_columns.len(),
    };
    let chunk_size =
        plan.effective_chunk_size(dialect, params_per_row, matches!(shape, Shape::Insert))?;

    let mut result = BatchResult {
        optimal_batch_size: chunk_size,
        ..BatchResult::default()
    };

    if plan.rows.is_empty() {
        debug!(shape = shape.as_str(), table = %plan.table, "empty batch");
        result.success = true;
        result.elapsed = started.elapsed();
        return Ok(result);
    }

    let entity = EntityContext::new(plan.table.clone());
    for (chunk_index, chunk) in plan.rows.chunks(chunk_size).enumerate() {
        if plan.is_cancelled() {
            info!(chunk_index, "batch cancelled");
            result.cancelled = true;
            break;
        }

        let mut ctx = CompileContext::new(&entity);
        let sql = match shape {
            Shape::Insert => {
                build_batch_insert(dialect, &mut ctx, &plan.table, &plan.columns, chunk)?
            }
            Shape::Update => build_batch_update(
                dialect,
                &mut ctx,
                &plan.table,
                &plan.columns,
                &plan.key_columns,
                chunk,
            )?,
            Shape::Delete => build_batch_delete(
                dialect,
                &mut ctx,
                &plan.table,
                &plan.columns,
                &plan.key_columns,
                chunk,
            )?,
        };
        let statement = finish_batch(sql, ctx);

        result.batch_count += 1;
        match executor.execute(&statement) {
            Ok(affected) => {
                info!(
                    shape = shape.as_str(),
                    chunk_index,
                    rows = chunk.len(),
                    affected,
                    "chunk executed"
                );
                result.affected_rows += affected;
            }
            Err(e) => {
                warn!(
                    shape = shape.as_str(),
                    chunk_index,
                    rows = chunk.len(),
                    error = %e,
                    "chunk failed"
                );
                result.errors.push(BatchError {
                    chunk_index,
                    rows: chunk.len(),
                    message: e.to_string(),
                });
                if !plan.continue_on_error {
                    break;
                }
            }
        }
    }

    result.success = result.errors.is_empty() && !result.cancelled;
    result.elapsed = started.elapsed();
    info!(
        shape = shape.as_str(),
        table = %plan.table,
        chunks = result.batch_count,
        affected = result.affected_rows,
        failed = result.errors.len(),
        "batch finished"
    );
    Ok(result)
}
