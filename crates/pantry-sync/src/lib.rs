//! Pantry Sync - Debounced auto-save and refresh guarding for editable lists.

pub mod config;
pub mod controller;
pub mod error;
pub mod remote;
pub mod state;

pub use config::{SyncConfig, DEFAULT_DEBOUNCE, DEFAULT_DRAG_PROTECTION};
pub use controller::{SubscriptionId, SyncController};
pub use error::SyncError;
pub use remote::{RemoteError, RemoteId, RemoteStore};
pub use state::{ReconcileOutcome, RefreshOutcome, SaveReport, SyncPhase, SyncState};
