use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Which product list a value belongs to. Drafts and slots are namespaced by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    MealPlan,
    GroceryList,
}

impl ListKind {
    pub const ALL: [ListKind; 2] = [ListKind::MealPlan, ListKind::GroceryList];

    /// Stable string used in storage keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::MealPlan => "meal-plan",
            ListKind::GroceryList => "grocery-list",
        }
    }

    /// Label used when a draft is saved without a name.
    pub fn default_label(&self) -> &'static str {
        match self {
            ListKind::MealPlan => "Meal Plan",
            ListKind::GroceryList => "Grocery List",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meal-plan" => Ok(ListKind::MealPlan),
            "grocery-list" => Ok(ListKind::GroceryList),
            other => Err(format!(
                "unknown list kind '{}' (expected meal-plan or grocery-list)",
                other
            )),
        }
    }
}

/// An element of an editable list.
///
/// The persistence and reorder engines only need a stable identity, value
/// equality (for change detection) and a serde representation that
/// round-trips exactly.
pub trait ListItem:
    Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable identity of this item.
    fn id(&self) -> &str;

    /// How many entries this item contributes to a draft's `entry_count`.
    fn entry_count(&self) -> usize {
        1
    }
}

/// Total entry count of a list, as recorded on drafts.
pub fn entry_count<T: ListItem>(list: &[T]) -> usize {
    list.iter().map(ListItem::entry_count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_kind_parse_roundtrip() {
        for kind in ListKind::ALL {
            assert_eq!(kind.as_str().parse::<ListKind>().unwrap(), kind);
        }
        assert!("pantry".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_list_kind_serde_matches_key() {
        let json = serde_json::to_string(&ListKind::GroceryList).unwrap();
        assert_eq!(json, "\"grocery-list\"");
    }
}
