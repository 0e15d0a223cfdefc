use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Draft name too long: {0} characters (max {max})", max = crate::validation::MAX_DRAFT_NAME_LEN)]
    NameTooLong(usize),

    #[error("Draft name contains control characters")]
    NameHasControlChars,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Draft not found: {0}")]
    DraftNotFound(Uuid),

    #[error("Invalid draft: {0}")]
    InvalidDraft(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
