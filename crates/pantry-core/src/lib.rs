//! Pantry Core - List model, normalization, drafts, and drag reordering.
//!
//! This crate holds the synchronous domain logic shared by the storage and
//! sync crates. It performs no I/O of its own.

pub mod draft;
pub mod entry;
pub mod error;
pub mod handoff;
pub mod list;
pub mod normalize;
pub mod reorder;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use draft::{default_name, Draft, DraftId, DraftMeta, DraftSummary};
pub use entry::{Entry, RichEntry, Section};
pub use error::{CoreError, StorageError, ValidationError};
pub use handoff::Handoff;
pub use list::{entry_count, ListItem, ListKind};
pub use normalize::{normalize, normalize_with_report, NormalizeReport};
pub use reorder::{DragSession, ReorderCommit, ReorderConfig, ReorderSession, DEFAULT_DRAG_THRESHOLD};
pub use storage::{DraftStore, Slot, SlotRecord, StoredDraft};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::InMemoryDraftStore;
