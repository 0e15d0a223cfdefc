//! Reconciles the historical on-disk list shapes into one canonical shape.
//!
//! Two container layouts exist in persisted data:
//!
//! - entries stored directly on the container (`entries`), the canonical form;
//! - entries spread across nested sub-groups (`groups` / `mealGroups`), each
//!   with its own `entries`.
//!
//! Both may appear on the same container. Normalization merges them in
//! encounter order (direct entries first), drops duplicates, and always
//! writes the nested groups back empty.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::entry::{Entry, Section};

/// Keys under which legacy nested groups were stored.
const GROUP_KEYS: [&str; 2] = ["groups", "mealGroups"];

/// Keys under which a top-level object may hold its containers.
const LIST_KEYS: [&str; 2] = ["sections", "days"];

/// Summary of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub sections: usize,
    pub entries: usize,
    pub duplicates_dropped: usize,
    pub unreadable_entries: usize,
    /// Input matched no known shape and was replaced by the placeholder container.
    pub fallback: bool,
}

/// Normalize a persisted list into canonical sections. Never fails.
pub fn normalize(raw: &Value) -> Vec<Section> {
    normalize_with_report(raw).0
}

/// Like [`normalize`], also returning what was merged and dropped.
pub fn normalize_with_report(raw: &Value) -> (Vec<Section>, NormalizeReport) {
    let mut report = NormalizeReport::default();

    let sections = match containers(raw) {
        Some(items) => {
            let sections: Vec<Section> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| match item {
                    Value::Object(obj) => Some(normalize_section(index, obj, &mut report)),
                    other => {
                        tracing::debug!("Skipping non-object container at {}: {}", index, other);
                        None
                    }
                })
                .collect();

            if sections.is_empty() && !items.is_empty() {
                fallback(&mut report)
            } else {
                sections
            }
        }
        None => fallback(&mut report),
    };

    report.sections = sections.len();
    (sections, report)
}

fn fallback(report: &mut NormalizeReport) -> Vec<Section> {
    tracing::warn!("Persisted list matched no known shape, using an empty default");
    report.fallback = true;
    vec![Section::placeholder()]
}

/// Locate the container array in any of the accepted top-level shapes.
fn containers(raw: &Value) -> Option<Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items.clone()),
        Value::Object(obj) => {
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = obj.get(key) {
                    return Some(items.clone());
                }
            }
            if is_container(obj) {
                return Some(vec![raw.clone()]);
            }
            None
        }
        _ => None,
    }
}

fn is_container(obj: &Map<String, Value>) -> bool {
    obj.contains_key("entries") || GROUP_KEYS.iter().any(|key| obj.contains_key(*key))
}

fn normalize_section(index: usize, obj: &Map<String, Value>, report: &mut NormalizeReport) -> Section {
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("section-{}", index),
    };
    let title_key = ["title", "name", "day"]
        .into_iter()
        .find(|key| matches!(obj.get(*key), Some(Value::String(_) | Value::Number(_))));
    let title = match title_key.and_then(|key| obj.get(key)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("Section {}", index + 1),
    };

    // Everything except the keys folded into canonical fields rides along.
    let extra: Map<String, Value> = obj
        .iter()
        .filter(|(key, _)| {
            let key = key.as_str();
            !matches!(key, "id" | "title" | "entries")
                && !GROUP_KEYS.contains(&key)
                && Some(key) != title_key
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let direct = obj.get("entries").and_then(Value::as_array).into_iter().flatten();
    let nested = GROUP_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|group| group.get("entries").and_then(Value::as_array))
        .flatten();

    let mut dedup = Dedup::default();
    let mut entries = Vec::new();
    for raw_entry in direct.chain(nested) {
        let Some(entry) = Entry::from_value(raw_entry) else {
            report.unreadable_entries += 1;
            continue;
        };
        if dedup.insert(&entry) {
            entries.push(entry);
        } else {
            report.duplicates_dropped += 1;
        }
    }

    report.entries += entries.len();
    Section {
        id,
        title,
        entries,
        groups: Vec::new(),
        extra,
    }
}

/// Tracks identities seen within one container.
#[derive(Default)]
struct Dedup {
    ids: HashSet<String>,
    titles: HashSet<String>,
}

impl Dedup {
    /// Record an entry. Returns false if it duplicates one already seen:
    /// by id when it has one, otherwise by title.
    fn insert(&mut self, entry: &Entry) -> bool {
        let title = entry.title().map(title_key);

        let duplicate = match entry.id() {
            Some(id) => self.ids.contains(id),
            None => title.as_ref().is_some_and(|t| self.titles.contains(t)),
        };
        if duplicate {
            return false;
        }

        if let Some(id) = entry.id() {
            self.ids.insert(id.to_string());
        }
        if let Some(title) = title {
            self.titles.insert(title);
        }
        true
    }
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}
