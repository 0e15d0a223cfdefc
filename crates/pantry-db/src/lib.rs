//! Pantry DB - redb implementation of the draft store.

pub mod draft_store;
pub mod tables;

pub use draft_store::RedbDraftStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use pantry_core::StorageError;

/// Open (or create) a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

    RedbDraftStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::{DraftStore, ListKind};
    use tempfile::tempdir;

    #[test]
    fn test_init_database_is_reopenable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let db = init_database(&path).unwrap();
            let store = RedbDraftStore::new(db);
            assert!(store.drafts_for(ListKind::MealPlan).unwrap().is_empty());
        }

        let db = init_database(&path).unwrap();
        let _store = RedbDraftStore::new(db);
    }
}
