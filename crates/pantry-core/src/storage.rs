use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::draft::{Draft, DraftMeta, DraftSummary};
use crate::error::StorageError;
use crate::list::{ListItem, ListKind};

/// Reserved per-kind slots outside the named-draft namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// Overwritten by every save cycle.
    Current,
    /// The previous `Current`, kept for recovery.
    Backup,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Current => "current",
            Slot::Backup => "backup",
        }
    }
}

/// Contents of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub saved_at: DateTime<Utc>,
    pub payload: Vec<Value>,
}

/// A draft as stored, with its payload kept as JSON values.
pub type StoredDraft = Draft<Value>;

/// Durable archive of named drafts and reserved slots.
///
/// Implementors provide the record-level operations; each write must be
/// all-or-nothing. The typed operations used by callers are provided on top.
pub trait DraftStore: Send + Sync {
    /// Insert a new draft record.
    fn put_draft(&self, draft: StoredDraft) -> Result<(), StorageError>;

    /// Get a draft record by ID.
    fn get_draft(&self, id: Uuid) -> Result<Option<StoredDraft>, StorageError>;

    /// Get all draft records of a kind, in no particular order.
    fn drafts_for(&self, kind: ListKind) -> Result<Vec<StoredDraft>, StorageError>;

    /// Write `Current`, moving any previous `Current` into `Backup` in the same write.
    fn rotate_current(&self, kind: ListKind, record: SlotRecord) -> Result<(), StorageError>;

    /// Read a slot.
    fn read_slot(&self, kind: ListKind, slot: Slot) -> Result<Option<SlotRecord>, StorageError>;

    /// Remove every slot of a kind. Returns how many were removed.
    fn clear_slots(&self, kind: ListKind) -> Result<usize, StorageError>;

    /// Create and durably store a new draft.
    fn save_draft<T: ListItem>(
        &self,
        kind: ListKind,
        list: &[T],
        name: Option<&str>,
        meta: DraftMeta,
    ) -> Result<Draft<T>, StorageError>
    where
        Self: Sized,
    {
        let draft = Draft::new(kind, list, name, meta)?;
        self.put_draft(encode_draft(&draft)?)?;
        tracing::info!(
            "Saved {} draft '{}' ({} entries)",
            kind,
            draft.name,
            draft.entry_count
        );
        Ok(draft)
    }

    /// All drafts of a kind, newest first.
    fn list_drafts<T: ListItem>(&self, kind: ListKind) -> Result<Vec<Draft<T>>, StorageError>
    where
        Self: Sized,
    {
        let mut drafts = self
            .drafts_for(kind)?
            .into_iter()
            .map(decode_draft)
            .collect::<Result<Vec<_>, _>>()?;
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(drafts)
    }

    /// Draft metadata of a kind, newest first, without decoding payloads.
    fn list_summaries(&self, kind: ListKind) -> Result<Vec<DraftSummary>, StorageError>
    where
        Self: Sized,
    {
        let mut summaries: Vec<DraftSummary> =
            self.drafts_for(kind)?.iter().map(DraftSummary::from).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// The payload of a draft, or `DraftNotFound`.
    fn load_draft<T: ListItem>(&self, id: Uuid) -> Result<Vec<T>, StorageError>
    where
        Self: Sized,
    {
        let stored = self.get_draft(id)?.ok_or(StorageError::DraftNotFound(id))?;
        Ok(decode_draft::<T>(stored)?.payload)
    }

    /// Overwrite the `Current` slot of a kind.
    fn save_current<T: ListItem>(&self, kind: ListKind, list: &[T]) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let record = SlotRecord {
            saved_at: Utc::now(),
            payload: encode_list(list)?,
        };
        self.rotate_current(kind, record)
    }

    /// The most recent readable slot of a kind: `Current`, else `Backup`.
    fn load_current<T: ListItem>(&self, kind: ListKind) -> Result<Option<Vec<T>>, StorageError>
    where
        Self: Sized,
    {
        for slot in [Slot::Current, Slot::Backup] {
            let record = match self.read_slot(kind, slot) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(StorageError::Serialization(e)) => {
                    tracing::warn!("Unreadable {} slot for {}: {}", slot.as_str(), kind, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            match decode_list(record.payload) {
                Ok(list) => {
                    if slot == Slot::Backup {
                        tracing::warn!("Recovered {} from backup slot", kind);
                    }
                    return Ok(Some(list));
                }
                Err(e) => {
                    tracing::warn!("Undecodable {} slot for {}: {}", slot.as_str(), kind, e);
                }
            }
        }
        Ok(None)
    }

    /// Remove scratch state for a kind, leaving named drafts untouched.
    fn clear_transient_state(&self, kind: ListKind) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let removed = self.clear_slots(kind)?;
        tracing::debug!("Cleared {} transient slots for {}", removed, kind);
        Ok(())
    }
}

pub fn encode_list<T: ListItem>(list: &[T]) -> Result<Vec<Value>, StorageError> {
    list.iter()
        .map(|item| serde_json::to_value(item).map_err(StorageError::from))
        .collect()
}

pub fn decode_list<T: ListItem>(payload: Vec<Value>) -> Result<Vec<T>, StorageError> {
    payload
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(StorageError::from))
        .collect()
}

pub fn encode_draft<T: ListItem>(draft: &Draft<T>) -> Result<StoredDraft, StorageError> {
    Ok(Draft {
        id: draft.id,
        kind: draft.kind,
        name: draft.name.clone(),
        created_at: draft.created_at,
        payload: encode_list(&draft.payload)?,
        auto_generated: draft.auto_generated,
        entry_count: draft.entry_count,
    })
}

pub fn decode_draft<T: ListItem>(stored: StoredDraft) -> Result<Draft<T>, StorageError> {
    Ok(Draft {
        id: stored.id,
        kind: stored.kind,
        name: stored.name,
        created_at: stored.created_at,
        payload: decode_list(stored.payload)?,
        auto_generated: stored.auto_generated,
        entry_count: stored.entry_count,
    })
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory draft store for testing.
    #[derive(Default)]
    pub struct InMemoryDraftStore {
        drafts: RwLock<HashMap<Uuid, StoredDraft>>,
        slots: RwLock<HashMap<(ListKind, Slot), SlotRecord>>,
    }

    impl InMemoryDraftStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Overwrite a slot directly, bypassing rotation.
        pub fn put_slot(&self, kind: ListKind, slot: Slot, record: SlotRecord) {
            self.slots.write().unwrap().insert((kind, slot), record);
        }
    }

    impl DraftStore for InMemoryDraftStore {
        fn put_draft(&self, draft: StoredDraft) -> Result<(), StorageError> {
            self.drafts.write().unwrap().insert(draft.id, draft);
            Ok(())
        }

        fn get_draft(&self, id: Uuid) -> Result<Option<StoredDraft>, StorageError> {
            Ok(self.drafts.read().unwrap().get(&id).cloned())
        }

        fn drafts_for(&self, kind: ListKind) -> Result<Vec<StoredDraft>, StorageError> {
            Ok(self
                .drafts
                .read()
                .unwrap()
                .values()
                .filter(|d| d.kind == kind)
                .cloned()
                .collect())
        }

        fn rotate_current(&self, kind: ListKind, record: SlotRecord) -> Result<(), StorageError> {
            let mut slots = self.slots.write().unwrap();
            if let Some(previous) = slots.remove(&(kind, Slot::Current)) {
                slots.insert((kind, Slot::Backup), previous);
            }
            slots.insert((kind, Slot::Current), record);
            Ok(())
        }

        fn read_slot(&self, kind: ListKind, slot: Slot) -> Result<Option<SlotRecord>, StorageError> {
            Ok(self.slots.read().unwrap().get(&(kind, slot)).cloned())
        }

        fn clear_slots(&self, kind: ListKind) -> Result<usize, StorageError> {
            let mut slots = self.slots.write().unwrap();
            let before = slots.len();
            slots.retain(|(k, _), _| *k != kind);
            Ok(before - slots.len())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::entry::{Entry, Section};
        use serde_json::json;

        fn plan(titles: &[&str]) -> Vec<Section> {
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| Section::new(format!("d{}", i), *t).with_entries(vec![Entry::label(*t)]))
                .collect()
        }

        #[test]
        fn test_draft_roundtrip() {
            let store = InMemoryDraftStore::new();
            let list = plan(&["Mon", "Tue"]);

            let draft = store
                .save_draft(ListKind::MealPlan, &list, Some("x"), DraftMeta::default())
                .unwrap();

            let loaded: Vec<Section> = store.load_draft(draft.id).unwrap();
            assert_eq!(loaded, list);
        }

        #[test]
        fn test_load_missing_draft() {
            let store = InMemoryDraftStore::new();
            let id = Uuid::new_v4();

            let result = store.load_draft::<Section>(id);
            assert_eq!(result, Err(StorageError::DraftNotFound(id)));
        }

        #[test]
        fn test_list_drafts_newest_first_and_by_kind() {
            let store = InMemoryDraftStore::new();
            let first = store
                .save_draft(ListKind::MealPlan, &plan(&["A"]), Some("first"), DraftMeta::default())
                .unwrap();
            let second = store
                .save_draft(ListKind::MealPlan, &plan(&["B"]), Some("second"), DraftMeta::default())
                .unwrap();
            store
                .save_draft(ListKind::GroceryList, &plan(&["C"]), None, DraftMeta::default())
                .unwrap();

            let drafts: Vec<Draft<Section>> = store.list_drafts(ListKind::MealPlan).unwrap();
            let names: Vec<_> = drafts.iter().map(|d| d.name.as_str()).collect();

            assert_eq!(names.len(), 2);
            assert!(second.created_at >= first.created_at);
            if second.created_at > first.created_at {
                assert_eq!(names, vec!["second", "first"]);
            }
        }

        #[test]
        fn test_current_rotates_into_backup() {
            let store = InMemoryDraftStore::new();

            store.save_current(ListKind::MealPlan, &plan(&["A"])).unwrap();
            store.save_current(ListKind::MealPlan, &plan(&["B"])).unwrap();

            let current: Vec<Section> = store.load_current(ListKind::MealPlan).unwrap().unwrap();
            assert_eq!(current, plan(&["B"]));

            let backup = store.read_slot(ListKind::MealPlan, Slot::Backup).unwrap().unwrap();
            assert_eq!(decode_list::<Section>(backup.payload).unwrap(), plan(&["A"]));
        }

        #[test]
        fn test_load_current_falls_back_to_backup() {
            let store = InMemoryDraftStore::new();
            store.save_current(ListKind::MealPlan, &plan(&["A"])).unwrap();
            store.save_current(ListKind::MealPlan, &plan(&["B"])).unwrap();
            store.put_slot(
                ListKind::MealPlan,
                Slot::Current,
                SlotRecord {
                    saved_at: Utc::now(),
                    payload: vec![json!({ "not": "a section" })],
                },
            );

            let current: Vec<Section> = store.load_current(ListKind::MealPlan).unwrap().unwrap();
            assert_eq!(current, plan(&["A"]));
        }

        #[test]
        fn test_clear_transient_state_keeps_drafts() {
            let store = InMemoryDraftStore::new();
            let draft = store
                .save_draft(ListKind::MealPlan, &plan(&["A"]), Some("keep"), DraftMeta::default())
                .unwrap();
            store.save_current(ListKind::MealPlan, &plan(&["A"])).unwrap();
            store.save_current(ListKind::MealPlan, &plan(&["B"])).unwrap();
            store.save_current(ListKind::GroceryList, &plan(&["C"])).unwrap();

            store.clear_transient_state(ListKind::MealPlan).unwrap();

            assert!(store.load_current::<Section>(ListKind::MealPlan).unwrap().is_none());
            assert!(store.load_current::<Section>(ListKind::GroceryList).unwrap().is_some());
            assert!(store.load_draft::<Section>(draft.id).is_ok());
        }
    }
}
