//! Errors shared by the processor and exporter halves of the pipeline.
use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;

/// A specialized `Result` type for export pipeline operations.
pub type ExportResult = Result<(), ExportError>;

/// Errors returned by processor and exporter operations.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExportError {
    /// The processor or exporter was already shut down when the operation
    /// was invoked. Shutdown is accepted exactly once; every later flush or
    /// shutdown request is rejected with this error before reaching the
    /// queue.
    #[error("shutdown already invoked")]
    AlreadyShutdown,

    /// A drain of the task queue was already in progress when this flush or
    /// shutdown request arrived. The request was enqueued and will be
    /// executed by the active drain owner; its outcome is not reported back
    /// to this caller.
    #[error("a drain is already in progress, request was queued for the active drain")]
    DrainInProgress,

    /// The operation did not finish within the allowed time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The operation failed inside the exporter or the pipeline internals.
    #[error("operation failed: {0}")]
    InternalFailure(String),
}

impl<T> From<PoisonError<T>> for ExportError {
    fn from(err: PoisonError<T>) -> Self {
        ExportError::InternalFailure(format!("mutex poisoned: {err}"))
    }
}
