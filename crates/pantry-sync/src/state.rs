use chrono::{DateTime, Utc};

use crate::error::SyncError;
use crate::remote::RemoteId;

/// Coarse position in the save state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Dirty,
    Saving,
}

/// Point-in-time view of a controller's sync state, for polling.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    pub dirty: bool,
    pub saving: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// An auto-save timer is armed.
    pub pending: bool,
}

impl SyncState {
    pub fn phase(&self) -> SyncPhase {
        if self.saving {
            SyncPhase::Saving
        } else if self.dirty {
            SyncPhase::Dirty
        } else {
            SyncPhase::Idle
        }
    }
}

/// Outcome of a save cycle whose local write succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub saved_at: DateTime<Utc>,
    /// The remote half of the cycle. A failure here leaves the list dirty.
    pub remote: Result<RemoteId, SyncError>,
}

impl SaveReport {
    /// True if both the local and the remote write succeeded.
    pub fn is_synced(&self) -> bool {
        self.remote.is_ok()
    }
}

/// Result of an external refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A reorder happened too recently; nothing was done.
    Suppressed,
    /// Subscribers were notified.
    Notified(usize),
}

/// Result of reconciling with the remote copy.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome<T> {
    /// Within the drag-protection window; the remote was not consulted.
    Suppressed,
    /// Local edits are unsaved, so the remote copy was ignored.
    KeptLocal,
    /// Remote and local lists already match.
    Unchanged,
    /// The remote list replaced the local baseline.
    Adopted(Vec<T>),
}
