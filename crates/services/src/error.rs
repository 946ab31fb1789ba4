//! Shared error types for the services crate.
//!
//! Nothing here is fatal to a running process: ingestion errors drop a
//! record or a source and continue, and store failures surface as
//! recoverable errors the presentation layer can report.

use thiserror::Error;

use quiz_storage::repository::StorageError;
use quiz_storage::sqlite::SqliteInitError;

/// Errors emitted by the ingestion batch job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    #[error("failed to read data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for the requested subject")]
    Empty,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
