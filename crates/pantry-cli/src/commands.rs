use std::io::Write;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use pantry_core::{
    normalize_with_report, CoreError, DraftMeta, DraftStore, ListKind, Section, StorageError,
};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid draft id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Core(e.into())
    }
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn normalize_file(path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let (sections, report) = normalize_with_report(&read_json(path)?);

    writeln!(out, "{}", serde_json::to_string_pretty(&sections)?)?;
    tracing::info!(
        "{} sections, {} entries, {} duplicates dropped, {} unreadable{}",
        report.sections,
        report.entries,
        report.duplicates_dropped,
        report.unreadable_entries,
        if report.fallback { " (fallback)" } else { "" }
    );
    Ok(())
}

pub fn list_drafts(store: &impl DraftStore, kind: ListKind, out: &mut impl Write) -> Result<(), CliError> {
    let summaries = store.list_summaries(kind)?;
    if summaries.is_empty() {
        writeln!(out, "No {} drafts", kind)?;
        return Ok(());
    }

    for draft in summaries {
        writeln!(
            out,
            "{}  {}  {:>4} entries  {}{}",
            draft.id,
            draft.created_at.format("%Y-%m-%d %H:%M"),
            draft.entry_count,
            draft.name,
            if draft.auto_generated { "  (auto)" } else { "" }
        )?;
    }
    Ok(())
}

pub fn save_draft(
    store: &impl DraftStore,
    kind: ListKind,
    path: &Path,
    name: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let (sections, report) = normalize_with_report(&read_json(path)?);
    if report.fallback {
        tracing::warn!("{} did not contain a recognizable list", path.display());
    }

    let draft = store.save_draft(kind, &sections, name, DraftMeta::default())?;
    writeln!(out, "{}", draft.id)?;
    Ok(())
}

pub fn show_draft(store: &impl DraftStore, id: &str, out: &mut impl Write) -> Result<(), CliError> {
    let id = Uuid::parse_str(id)?;
    let payload: Vec<Section> = store.load_draft(id)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}

pub fn show_current(store: &impl DraftStore, kind: ListKind, out: &mut impl Write) -> Result<(), CliError> {
    match store.load_current::<Section>(kind)? {
        Some(list) => writeln!(out, "{}", serde_json::to_string_pretty(&list)?)?,
        None => writeln!(out, "No saved {}", kind)?,
    }
    Ok(())
}

pub fn clear(store: &impl DraftStore, kind: ListKind, out: &mut impl Write) -> Result<(), CliError> {
    let removed = store.clear_slots(kind)?;
    writeln!(out, "Cleared {} slot(s) for {}", removed, kind)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_db::{init_database, RedbDraftStore};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, RedbDraftStore) {
        let dir = tempdir().unwrap();
        let db = init_database(dir.path().join("cli.redb")).unwrap();
        (dir, RedbDraftStore::new(db))
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CliError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_normalize_prints_canonical_json() {
        let dir = tempdir().unwrap();
        let path = write_file(&dir, "week.json", r#"[{"id":"mon","mealGroups":[{"entries":["Soup"]}]}]"#);

        let printed = output(|out| normalize_file(&path, out));

        let value: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(value[0]["entries"][0], "Soup");
        assert_eq!(value[0]["groups"], serde_json::json!([]));
    }

    #[test]
    fn test_save_list_and_show_draft() {
        let (dir, store) = setup();
        let path = write_file(&dir, "shop.json", r#"{"entries":["Milk","milk","Eggs"]}"#);

        let id = output(|out| save_draft(&store, ListKind::GroceryList, &path, Some("Friday"), out));
        let id = id.trim();

        let listing = output(|out| list_drafts(&store, ListKind::GroceryList, out));
        assert!(listing.contains(id));
        assert!(listing.contains("Friday"));
        assert!(listing.contains("2 entries"));

        let shown = output(|out| show_draft(&store, id, out));
        let sections: Vec<Section> = serde_json::from_str(&shown).unwrap();
        assert_eq!(sections[0].entries.len(), 2);

        assert_eq!(
            output(|out| list_drafts(&store, ListKind::MealPlan, out)),
            "No meal-plan drafts\n"
        );
    }

    #[test]
    fn test_show_draft_rejects_bad_id() {
        let (_dir, store) = setup();
        let mut buf = Vec::new();

        assert!(matches!(
            show_draft(&store, "not-a-uuid", &mut buf),
            Err(CliError::InvalidId(_))
        ));
        assert!(matches!(
            show_draft(&store, &Uuid::new_v4().to_string(), &mut buf),
            Err(CliError::Core(CoreError::Storage(StorageError::DraftNotFound(_))))
        ));
    }

    #[test]
    fn test_save_rejects_long_name() {
        let (dir, store) = setup();
        let path = write_file(&dir, "plan.json", "[]");
        let name = "x".repeat(200);
        let mut buf = Vec::new();

        let result = save_draft(&store, ListKind::MealPlan, &path, Some(&name), &mut buf);
        assert!(matches!(
            result,
            Err(CliError::Core(CoreError::Storage(StorageError::InvalidDraft(_))))
        ));
    }

    #[test]
    fn test_current_and_clear() {
        let (_dir, store) = setup();
        let list = vec![Section::new("mon", "Monday")];
        store.save_current(ListKind::MealPlan, &list).unwrap();

        let shown = output(|out| show_current(&store, ListKind::MealPlan, out));
        assert_eq!(serde_json::from_str::<Vec<Section>>(&shown).unwrap(), list);

        assert_eq!(
            output(|out| clear(&store, ListKind::MealPlan, out)),
            "Cleared 1 slot(s) for meal-plan\n"
        );
        assert_eq!(
            output(|out| show_current(&store, ListKind::MealPlan, out)),
            "No saved meal-plan\n"
        );
    }
}
