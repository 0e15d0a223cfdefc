use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier the remote system assigned to a saved list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteId(pub String);

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error reported by a remote collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rejected by remote: {0}")]
    Rejected(String),
}

/// The remote persistence API for one list type.
///
/// Retries and transport concerns belong to the implementor.
pub trait RemoteStore<T>: Send + Sync + 'static {
    /// Upsert the canonical list under `name`.
    fn save(
        &self,
        list: &[T],
        name: &str,
    ) -> impl Future<Output = Result<RemoteId, RemoteError>> + Send;

    /// Fetch a canonical list.
    fn load(&self, id: &RemoteId) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;
}
