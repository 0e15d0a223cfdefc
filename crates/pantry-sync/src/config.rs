use std::time::Duration;

/// Quiet period after the last change before an auto-save fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

/// Cooldown after a reorder during which external refreshes are ignored.
pub const DEFAULT_DRAG_PROTECTION: Duration = Duration::from_millis(3000);

/// Tuning for a [`SyncController`](crate::SyncController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub drag_protection: Duration,
    /// Also write an auto-generated named draft after each successful debounced save.
    pub snapshot_on_autosave: bool,
    /// Name sent to the remote store. Defaults to the list kind's label.
    pub remote_name: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            drag_protection: DEFAULT_DRAG_PROTECTION,
            snapshot_on_autosave: false,
            remote_name: None,
        }
    }
}

impl SyncConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_drag_protection(mut self, window: Duration) -> Self {
        self.drag_protection = window;
        self
    }

    pub fn with_snapshot_on_autosave(mut self, enabled: bool) -> Self {
        self.snapshot_on_autosave = enabled;
        self
    }

    pub fn with_remote_name(mut self, name: impl Into<String>) -> Self {
        self.remote_name = Some(name.into());
        self
    }
}
