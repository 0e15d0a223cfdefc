use std::sync::Arc;

use redb::{Database, ReadableTable};
use uuid::Uuid;

use pantry_core::{DraftStore, ListKind, Slot, SlotRecord, StorageError, StoredDraft};

use crate::tables::{draft_key_range, encode_draft_key, slot_key, DRAFTS_TABLE, SLOTS_TABLE};

/// redb implementation of DraftStore.
pub struct RedbDraftStore {
    db: Arc<Database>,
}

impl RedbDraftStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            // Create tables if they don't exist
            let _ = write_txn
                .open_table(DRAFTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            let _ = write_txn
                .open_table(SLOTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

impl DraftStore for RedbDraftStore {
    fn put_draft(&self, draft: StoredDraft) -> Result<(), StorageError> {
        let key = encode_draft_key(draft.kind, draft.id);
        let value = serde_json::to_vec(&draft)?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        {
            let mut table = write_txn
                .open_table(DRAFTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_draft(&self, id: Uuid) -> Result<Option<StoredDraft>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let table = read_txn
            .open_table(DRAFTS_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        for kind in ListKind::ALL {
            let key = encode_draft_key(kind, id);
            if let Some(value) = table
                .get(key.as_slice())
                .map_err(|e| StorageError::Database(e.to_string()))?
            {
                let draft: StoredDraft = serde_json::from_slice(value.value())?;
                return Ok(Some(draft));
            }
        }

        Ok(None)
    }

    fn drafts_for(&self, kind: ListKind) -> Result<Vec<StoredDraft>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let table = read_txn
            .open_table(DRAFTS_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let (start_key, end_key) = draft_key_range(kind);

        let mut drafts = Vec::new();
        let range = table
            .range(start_key.as_slice()..end_key.as_slice())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        for entry in range {
            let (_, value) = entry.map_err(|e| StorageError::Database(e.to_string()))?;
            let draft: StoredDraft = serde_json::from_slice(value.value())?;
            drafts.push(draft);
        }

        Ok(drafts)
    }

    fn rotate_current(&self, kind: ListKind, record: SlotRecord) -> Result<(), StorageError> {
        let current_key = slot_key(kind, Slot::Current);
        let backup_key = slot_key(kind, Slot::Backup);
        let value = serde_json::to_vec(&record)?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        {
            let mut table = write_txn
                .open_table(SLOTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            let previous = table
                .get(current_key.as_str())
                .map_err(|e| StorageError::Database(e.to_string()))?
                .map(|v| v.value().to_vec());

            if let Some(previous) = previous {
                table
                    .insert(backup_key.as_str(), previous.as_slice())
                    .map_err(|e| StorageError::Database(e.to_string()))?;
            }

            table
                .insert(current_key.as_str(), value.as_slice())
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        tracing::debug!("Wrote current slot for {}", kind);
        Ok(())
    }

    fn read_slot(&self, kind: ListKind, slot: Slot) -> Result<Option<SlotRecord>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let table = read_txn
            .open_table(SLOTS_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let key = slot_key(kind, slot);
        match table
            .get(key.as_str())
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            Some(value) => {
                let record: SlotRecord = serde_json::from_slice(value.value())?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn clear_slots(&self, kind: ListKind) -> Result<usize, StorageError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut removed = 0;
        {
            let mut table = write_txn
                .open_table(SLOTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            for slot in [Slot::Current, Slot::Backup] {
                let key = slot_key(kind, slot);
                let result = table
                    .remove(key.as_str())
                    .map_err(|e| StorageError::Database(e.to_string()))?;
                if result.is_some() {
                    removed += 1;
                }
            }
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(removed)
    }
}
