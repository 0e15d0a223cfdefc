use thiserror::Error;

use pantry_core::StorageError;

/// Errors surfaced by the sync controller.
///
/// `Clone` so a single save outcome can be handed to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Local write failed: {0}")]
    LocalWriteFailure(String),

    #[error("Remote save failed: {0}")]
    RemoteSaveFailure(String),

    #[error("Remote load failed: {0}")]
    RemoteLoadFailure(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Save cycle ended without reporting an outcome")]
    Interrupted,
}
