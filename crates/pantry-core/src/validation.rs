use crate::error::ValidationError;

/// Longest draft name accepted, in characters.
pub const MAX_DRAFT_NAME_LEN: usize = 120;

/// Validator for user-supplied draft metadata.
pub struct Validator;

impl Validator {
    /// Validate and tidy an optional draft name.
    ///
    /// Surrounding whitespace is trimmed. A name that is empty after
    /// trimming is treated as absent so the store synthesizes one.
    pub fn validate_draft_name(name: Option<&str>) -> Result<Option<String>, ValidationError> {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };

        let len = name.chars().count();
        if len > MAX_DRAFT_NAME_LEN {
            return Err(ValidationError::NameTooLong(len));
        }
        if name.chars().any(char::is_control) {
            return Err(ValidationError::NameHasControlChars);
        }
        Ok(Some(name.to_string()))
    }
}
