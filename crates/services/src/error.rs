//! Shared error types for the services crate.

use thiserror::Error;

use lingo_core::attempt::AttemptError;
use storage::content_pack::ContentPackError;
use storage::record::RecordError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService` writes.
///
/// Reads never fail; they fall back to a fresh aggregate instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("stored progress uses schema version {found}, newer than supported version {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the placement and level test flows.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizFlowError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    ContentPack(#[from] ContentPackError),
}
