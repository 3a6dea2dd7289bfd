//! The seam to the external execution layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ExecutionError;
use crate::statement::ParameterizedStatement;

/// Executes one chunk statement and reports the number of affected rows.
///
/// Implemented for any `FnMut(&ParameterizedStatement) -> Result<u64, ExecutionError>`.
pub trait ChunkExecutor {
    /// Runs `statement` against the caller's connection.
    ///
    /// # Errors
    ///
    /// Whatever the underlying database call reports.
    fn execute(&mut self, statement: &ParameterizedStatement) -> Result<u64, ExecutionError>;
}

impl<F> ChunkExecutor for F
where
    F: FnMut(&ParameterizedStatement) -> Result<u64, ExecutionError>,
{
    fn execute(&mut self, statement: &ParameterizedStatement) -> Result<u64, ExecutionError> {
        self(statement)
    }
}

/// A cancellation signal shared between the caller and a running batch.
///
/// The batch loop checks it between chunks, never during one.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
