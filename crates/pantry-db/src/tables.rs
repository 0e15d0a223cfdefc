use redb::TableDefinition;
use uuid::Uuid;

use pantry_core::{ListKind, Slot};

/// Table for storing named drafts.
/// Key: (kind tag, draft UUID) as bytes
/// Value: serialized StoredDraft as bytes
pub const DRAFTS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("drafts");

/// Table for storing reserved per-kind slots.
/// Key: "<kind>/<slot>"
/// Value: serialized SlotRecord as bytes
pub const SLOTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("slots");

/// Single-byte tag for a list kind, used as the draft key prefix.
pub fn kind_tag(kind: ListKind) -> u8 {
    match kind {
        ListKind::MealPlan => 1,
        ListKind::GroceryList => 2,
    }
}

/// Encode a draft key (kind, id) to bytes.
pub fn encode_draft_key(kind: ListKind, id: Uuid) -> [u8; 17] {
    let mut key = [0u8; 17];
    key[0] = kind_tag(kind);
    key[1..].copy_from_slice(id.as_bytes());
    key
}

/// Key range covering every draft of a kind.
pub fn draft_key_range(kind: ListKind) -> ([u8; 17], [u8; 17]) {
    let mut start = [0u8; 17];
    let mut end = [0u8; 17];
    start[0] = kind_tag(kind);
    end[0] = kind_tag(kind) + 1;
    (start, end)
}

/// Encode a slot key.
pub fn slot_key(kind: ListKind, slot: Slot) -> String {
    format!("{}/{}", kind.as_str(), slot.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_keys_group_by_kind() {
        let id = Uuid::new_v4();
        let key = encode_draft_key(ListKind::GroceryList, id);
        let (start, end) = draft_key_range(ListKind::GroceryList);

        assert!(start <= key && key < end);
        assert_eq!(&key[1..], id.as_bytes());

        let (meal_start, meal_end) = draft_key_range(ListKind::MealPlan);
        assert!(!(meal_start <= key && key < meal_end));
    }

    #[test]
    fn test_slot_key() {
        assert_eq!(slot_key(ListKind::MealPlan, Slot::Current), "meal-plan/current");
        assert_eq!(slot_key(ListKind::GroceryList, Slot::Backup), "grocery-list/backup");
    }
}
