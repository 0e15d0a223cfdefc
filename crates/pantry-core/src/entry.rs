use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::list::ListItem;

/// A recipe or grocery entry in one of the shapes found in persisted lists.
///
/// Resolved once by the normalizer so read sites never need to guess which
/// representation they were handed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    /// Object carrying data beyond a bare id, usually a title.
    Rich(RichEntry),
    /// Bare identifier pointing at an entry stored elsewhere.
    Reference { id: String },
    /// Free-text label from the oldest list format.
    LegacyLabel(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Every other key of the source object, kept verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn rich(id: impl Into<String>, title: impl Into<String>) -> Self {
        Entry::Rich(RichEntry {
            id: Some(id.into()),
            title: Some(title.into()),
            fields: Map::new(),
        })
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Entry::Reference { id: id.into() }
    }

    pub fn label(text: impl Into<String>) -> Self {
        Entry::LegacyLabel(text.into())
    }

    /// Resolve a raw JSON value into an entry.
    ///
    /// Strings are legacy labels. Numbers and objects holding nothing but an
    /// `id` are references. Any other non-empty object is rich, titled by its
    /// `title` (or legacy `name`) when it has one, with all remaining keys
    /// kept. Returns `None` for blank strings, empty objects and other JSON.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Entry::LegacyLabel(text.clone())),
            Value::Number(n) => Some(Entry::Reference { id: n.to_string() }),
            Value::Object(obj) if !obj.is_empty() => {
                let id = obj.get("id").and_then(id_string);
                if obj.len() == 1 {
                    if let Some(id) = id {
                        return Some(Entry::Reference { id });
                    }
                }

                let title_key = match obj.get("title") {
                    Some(Value::String(_)) => Some("title"),
                    Some(_) => None,
                    None => obj.get("name").and_then(Value::as_str).map(|_| "name"),
                };
                let title = title_key
                    .and_then(|key| obj.get(key))
                    .and_then(Value::as_str)
                    .map(str::to_string);

                let fields = obj
                    .iter()
                    .filter(|(k, _)| !(id.is_some() && k.as_str() == "id"))
                    .filter(|(k, _)| Some(k.as_str()) != title_key)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Some(Entry::Rich(RichEntry { id, title, fields }))
            }
            _ => None,
        }
    }

    /// Stable identifier, when the entry has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Entry::Rich(rich) => rich.id.as_deref(),
            Entry::Reference { id } => Some(id),
            Entry::LegacyLabel(_) => None,
        }
    }

    /// Human-readable title, when the entry has one.
    pub fn title(&self) -> Option<&str> {
        match self {
            Entry::Rich(rich) => rich.title.as_deref(),
            Entry::Reference { .. } => None,
            Entry::LegacyLabel(text) => Some(text),
        }
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Entry::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("entry is empty or not a string, number or object"))
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A container of entries: one day of a meal plan, or one aisle of a grocery list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    /// Legacy nested groups. Always written empty; entries live in `entries`.
    #[serde(default)]
    pub groups: Vec<Value>,
    /// Container keys with no dedicated field, such as a day's `date`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            entries: Vec::new(),
            groups: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_entries(mut self, entries: Vec<Entry>) -> Self {
        self.entries = entries;
        self
    }

    /// The container used when persisted input is unreadable.
    pub fn placeholder() -> Self {
        Self::new("default", "Untitled")
    }
}

impl ListItem for Section {
    fn id(&self) -> &str {
        &self.id
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
