use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::list::{entry_count, ListItem, ListKind};
use crate::validation::Validator;

/// Identifier of a stored draft.
pub type DraftId = Uuid;

/// Caller-supplied metadata for a new draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftMeta {
    /// Set when the draft was written by the auto-save cycle rather than the user.
    pub auto_generated: bool,
}

impl DraftMeta {
    pub fn auto() -> Self {
        Self {
            auto_generated: true,
        }
    }
}

/// An immutable, named snapshot of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft<T> {
    pub id: DraftId,
    pub kind: ListKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub payload: Vec<T>,
    pub auto_generated: bool,
    pub entry_count: usize,
}

impl<T: ListItem> Draft<T> {
    /// Build a new draft, synthesizing a name when none is given.
    pub fn new(
        kind: ListKind,
        list: &[T],
        name: Option<&str>,
        meta: DraftMeta,
    ) -> Result<Self, ValidationError> {
        let created_at = Utc::now();
        let name = match Validator::validate_draft_name(name)? {
            Some(name) => name,
            None => default_name(kind, created_at),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            name,
            created_at,
            payload: list.to_vec(),
            auto_generated: meta.auto_generated,
            entry_count: entry_count(list),
        })
    }
}

/// `"<default label> - <local wall-clock time>"`.
pub fn default_name(kind: ListKind, at: DateTime<Utc>) -> String {
    format!(
        "{} - {}",
        kind.default_label(),
        at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )
}

/// Draft metadata without the payload, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub id: DraftId,
    pub kind: ListKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub auto_generated: bool,
    pub entry_count: usize,
}

impl<T> From<&Draft<T>> for DraftSummary {
    fn from(draft: &Draft<T>) -> Self {
        Self {
            id: draft.id,
            kind: draft.kind,
            name: draft.name.clone(),
            created_at: draft.created_at,
            auto_generated: draft.auto_generated,
            entry_count: draft.entry_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, Section};

    fn sample() -> Vec<Section> {
        vec![
            Section::new("mon", "Monday").with_entries(vec![Entry::label("Oats"), Entry::reference("r1")]),
            Section::new("tue", "Tuesday").with_entries(vec![Entry::label("Soup")]),
        ]
    }

    #[test]
    fn test_new_draft_counts_entries() {
        let draft = Draft::new(ListKind::MealPlan, &sample(), Some("Week 1"), DraftMeta::default()).unwrap();

        assert_eq!(draft.name, "Week 1");
        assert_eq!(draft.entry_count, 3);
        assert_eq!(draft.payload, sample());
        assert!(!draft.auto_generated);
    }

    #[test]
    fn test_new_draft_synthesizes_name() {
        let draft = Draft::new(ListKind::GroceryList, &sample(), None, DraftMeta::auto()).unwrap();

        assert!(draft.name.starts_with("Grocery List - "));
        assert!(draft.auto_generated);
    }

    #[test]
    fn test_new_draft_rejects_invalid_name() {
        let long = "x".repeat(500);
        assert!(Draft::new(ListKind::MealPlan, &sample(), Some(&long), DraftMeta::default()).is_err());
    }

    #[test]
    fn test_summary_drops_payload() {
        let draft = Draft::new(ListKind::MealPlan, &sample(), Some("Week 1"), DraftMeta::default()).unwrap();
        let summary = DraftSummary::from(&draft);

        assert_eq!(summary.id, draft.id);
        assert_eq!(summary.entry_count, 3);
    }
}
