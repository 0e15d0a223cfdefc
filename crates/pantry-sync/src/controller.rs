use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use pantry_core::{Draft, DraftId, DraftMeta, DraftStore, ListItem, ListKind, ReorderCommit};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::remote::{RemoteId, RemoteStore};
use crate::state::{ReconcileOutcome, RefreshOutcome, SaveReport, SyncPhase, SyncState};

type SaveResult = Result<SaveReport, SyncError>;
type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`SyncController::on_external_invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Debounce,
    Manual,
}

/// Keeps one editable list durable: tracks dirty state, debounces
/// auto-saves, and guards against stale refreshes after a reorder.
///
/// Cheap to clone; clones share state. Methods that arm timers or start
/// saves spawn tokio tasks and must be called from within a runtime.
pub struct SyncController<T, S, R> {
    inner: Arc<Inner<T, S, R>>,
}

impl<T, S, R> Clone for SyncController<T, S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<T, S, R> {
    kind: ListKind,
    name: String,
    config: SyncConfig,
    store: Arc<S>,
    remote: Arc<R>,
    shared: Mutex<Shared<T>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

struct Shared<T> {
    /// Last value handed to us by the caller.
    list: Vec<T>,
    dirty: bool,
    last_saved_at: Option<chrono::DateTime<Utc>>,
    last_error: Option<String>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every (re)arm so a superseded timer can tell it is stale.
    timer_generation: u64,
    /// Present while a save cycle is running.
    in_flight: Option<watch::Receiver<Option<SaveResult>>>,
    /// A change arrived mid-save; arm the timer once the save finishes.
    rearm_after_save: bool,
    last_reorder_at: Option<Instant>,
    next_subscription: u64,
    /// Bumped whenever the clean baseline is reset outside a save cycle
    /// (`mark_saved`, `start_fresh`, an adopted remote copy). A cycle that
    /// started under an older epoch must not touch dirty or saved state.
    baseline_epoch: u64,
}

/// Clears `in_flight` if a save task unwinds before reporting.
struct CycleGuard<T, S, R> {
    controller: SyncController<T, S, R>,
    finished: bool,
}

impl<T, S, R> Drop for CycleGuard<T, S, R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut shared = self
            .controller
            .inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        shared.in_flight = None;
        shared.dirty = true;
        shared.last_error = Some(SyncError::Interrupted.to_string());
        tracing::error!("Save cycle for {} aborted", self.controller.inner.kind);
    }
}

impl<T, S, R> SyncController<T, S, R>
where
    T: ListItem,
    S: DraftStore + 'static,
    R: RemoteStore<T>,
{
    /// Create a controller whose clean baseline is `initial`.
    pub fn new(
        kind: ListKind,
        initial: Vec<T>,
        store: Arc<S>,
        remote: Arc<R>,
        config: SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                name: config
                    .remote_name
                    .clone()
                    .unwrap_or_else(|| kind.default_label().to_string()),
                config,
                store,
                remote,
                shared: Mutex::new(Shared {
                    list: initial,
                    dirty: false,
                    last_saved_at: None,
                    last_error: None,
                    timer: None,
                    timer_generation: 0,
                    in_flight: None,
                    rearm_after_save: false,
                    last_reorder_at: None,
                    next_subscription: 0,
                    baseline_epoch: 0,
                }),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Name passed to the remote store on save.
    pub fn remote_name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> ListKind {
        self.inner.kind
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// The most recent list value seen.
    pub fn list(&self) -> Vec<T> {
        self.lock().list.clone()
    }

    pub fn state(&self) -> SyncState {
        let shared = self.lock();
        SyncState {
            dirty: shared.dirty,
            saving: shared.in_flight.is_some(),
            last_saved_at: shared.last_saved_at,
            last_error: shared.last_error.clone(),
            pending: shared.timer.is_some(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.state().phase()
    }

    /// Record the caller's current list. A different value marks the list
    /// dirty and restarts the debounce timer; during a save, the timer is
    /// armed once that save finishes instead.
    pub fn note_change(&self, new_list: Vec<T>) {
        let mut shared = self.lock();
        if shared.list == new_list {
            return;
        }

        shared.list = new_list;
        shared.dirty = true;

        if shared.in_flight.is_some() {
            tracing::debug!("{} changed during save, will re-arm afterwards", self.inner.kind);
            shared.rearm_after_save = true;
        } else {
            self.arm_timer(&mut shared);
        }
    }

    /// Cancel any pending timer and save now, whether or not the list is dirty.
    ///
    /// If a save is already running, no new one is started: this waits for
    /// it and returns its outcome.
    pub async fn force_save(&self) -> Result<SaveReport, SyncError> {
        let rx = self.start_cycle(Trigger::Manual);
        wait_for_outcome(rx).await
    }

    /// Store the current list as a named draft. Does not affect dirty state.
    pub fn save_as_draft(&self, name: Option<&str>) -> Result<Draft<T>, SyncError> {
        let list = self.list();
        let draft = self
            .inner
            .store
            .save_draft(self.inner.kind, &list, name, DraftMeta::default())?;
        Ok(draft)
    }

    /// Mark the list clean after it was persisted by some other path.
    pub fn mark_saved(&self) {
        let mut shared = self.lock();
        if let Some(timer) = shared.timer.take() {
            timer.abort();
        }
        shared.dirty = false;
        shared.rearm_after_save = false;
        shared.last_saved_at = Some(Utc::now());
        shared.last_error = None;
        shared.baseline_epoch += 1;
    }

    /// Load a draft's payload and make it the working list.
    pub fn restore_draft(&self, id: DraftId) -> Result<Vec<T>, SyncError> {
        let list: Vec<T> = self.inner.store.load_draft(id)?;
        tracing::info!("Restored {} draft {}", self.inner.kind, id);
        self.note_change(list.clone());
        Ok(list)
    }

    /// The list last written to the local `current` slot, if any.
    pub fn load_current(&self) -> Result<Option<Vec<T>>, SyncError> {
        Ok(self.inner.store.load_current(self.inner.kind)?)
    }

    /// Start-up recovery: adopt the last locally written list as the working
    /// list. It is treated as unsaved, since the remote may never have seen it.
    pub fn recover(&self) -> Result<Option<Vec<T>>, SyncError> {
        let Some(list) = self.load_current()? else {
            return Ok(None);
        };
        tracing::info!("Recovered {} from local slot ({} items)", self.inner.kind, list.len());
        self.note_change(list.clone());
        Ok(Some(list))
    }

    /// Begin a brand-new list: drop scratch slots and reset the baseline.
    pub fn start_fresh(&self, list: Vec<T>) -> Result<(), SyncError> {
        self.inner.store.clear_transient_state(self.inner.kind)?;

        let mut shared = self.lock();
        if let Some(timer) = shared.timer.take() {
            timer.abort();
        }
        shared.list = list;
        shared.dirty = false;
        shared.rearm_after_save = false;
        shared.last_saved_at = None;
        shared.last_error = None;
        shared.baseline_epoch += 1;
        Ok(())
    }

    /// Feed a finished drag into the controller.
    ///
    /// A commit that changed the order stamps the drag-protection window and
    /// is recorded like any other change.
    pub fn apply_reorder(&self, commit: &ReorderCommit<T>) {
        if !commit.changed() {
            return;
        }
        self.lock().last_reorder_at = Some(Instant::now());
        self.note_change(commit.list.clone());
    }

    /// True while external refreshes must be ignored after a reorder.
    pub fn is_refresh_suppressed(&self) -> bool {
        self.lock()
            .last_reorder_at
            .is_some_and(|at| at.elapsed() < self.inner.config.drag_protection)
    }

    /// Subscribe to external-invalidate events.
    pub fn on_external_invalidate<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = {
            let mut shared = self.lock();
            shared.next_subscription += 1;
            SubscriptionId(shared.next_subscription)
        };
        self.listeners().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    /// Entry point for focus or visibility refreshes. Notifies subscribers
    /// unless a reorder landed within the drag-protection window.
    pub fn external_refresh(&self) -> RefreshOutcome {
        if self.is_refresh_suppressed() {
            tracing::debug!("External refresh of {} suppressed after reorder", self.inner.kind);
            return RefreshOutcome::Suppressed;
        }

        let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| l.clone()).collect();
        for listener in &listeners {
            listener();
        }
        RefreshOutcome::Notified(listeners.len())
    }

    /// Fetch the remote copy and adopt it if the local list has no unsaved edits.
    pub async fn reconcile(&self, id: &RemoteId) -> Result<ReconcileOutcome<T>, SyncError> {
        if self.is_refresh_suppressed() {
            return Ok(ReconcileOutcome::Suppressed);
        }

        let remote = self
            .inner
            .remote
            .load(id)
            .await
            .map_err(|e| SyncError::RemoteLoadFailure(e.to_string()))?;

        // A reorder may have landed while the load was in flight.
        if self.is_refresh_suppressed() {
            return Ok(ReconcileOutcome::Suppressed);
        }

        let mut shared = self.lock();
        if shared.dirty || shared.in_flight.is_some() {
            return Ok(ReconcileOutcome::KeptLocal);
        }
        if shared.list == remote {
            return Ok(ReconcileOutcome::Unchanged);
        }
        shared.list = remote.clone();
        shared.baseline_epoch += 1;
        tracing::info!("Adopted remote copy of {} ({} items)", self.inner.kind, remote.len());
        Ok(ReconcileOutcome::Adopted(remote))
    }

    /// Periodically reconcile with the remote copy.
    pub async fn run_reconcile(&self, id: RemoteId, interval: Duration) {
        loop {
            match self.reconcile(&id).await {
                Ok(ReconcileOutcome::Adopted(list)) => {
                    tracing::info!("Reconciled {} from remote ({} items)", self.inner.kind, list.len());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Reconcile error for {}: {}", self.inner.kind, e);
                }
            }

            sleep(interval).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel any pending timer and schedule a new one.
    fn arm_timer(&self, shared: &mut Shared<T>) {
        if let Some(timer) = shared.timer.take() {
            timer.abort();
        }
        shared.timer_generation += 1;

        let generation = shared.timer_generation;
        let delay = self.inner.config.debounce;
        let weak: Weak<Inner<T, S, R>> = Arc::downgrade(&self.inner);

        shared.timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                SyncController { inner }.on_timer(generation).await;
            }
        }));
    }

    async fn on_timer(&self, generation: u64) {
        {
            let mut shared = self.lock();
            if shared.timer_generation != generation {
                return;
            }
            // Detach rather than abort: this task is the one running.
            shared.timer = None;
            if shared.in_flight.is_some() {
                shared.rearm_after_save = true;
                return;
            }
        }

        tracing::debug!("Debounce elapsed for {}", self.inner.kind);
        if let Err(e) = wait_for_outcome(self.start_cycle(Trigger::Debounce)).await {
            tracing::debug!("Auto-save of {} did not complete: {}", self.inner.kind, e);
        }
    }

    /// Start a save cycle, or join the one already running.
    fn start_cycle(&self, trigger: Trigger) -> watch::Receiver<Option<SaveResult>> {
        let mut shared = self.lock();

        if let Some(rx) = &shared.in_flight {
            tracing::debug!("Save of {} already in flight, waiting on it", self.inner.kind);
            return rx.clone();
        }

        if let Some(timer) = shared.timer.take() {
            timer.abort();
        }
        shared.rearm_after_save = false;

        let (tx, rx) = watch::channel(None);
        shared.in_flight = Some(rx.clone());
        let list = shared.list.clone();
        let epoch = shared.baseline_epoch;
        drop(shared);

        // The cycle runs on its own task so a caller dropping its future
        // cannot leave the controller stuck in `Saving`.
        let mut guard = CycleGuard {
            controller: self.clone(),
            finished: false,
        };
        tokio::spawn(async move {
            let outcome = guard.controller.run_cycle(&list, trigger).await;
            guard.controller.finish_cycle(&list, epoch, &outcome);
            guard.finished = true;
            tx.send_replace(Some(outcome));
        });

        rx
    }

    async fn run_cycle(&self, list: &[T], trigger: Trigger) -> SaveResult {
        let kind = self.inner.kind;
        let saved_at = Utc::now();

        if let Err(e) = self.inner.store.save_current(kind, list) {
            tracing::error!("Local save of {} failed: {}", kind, e);
            return Err(SyncError::LocalWriteFailure(e.to_string()));
        }

        let remote = match self.inner.remote.save(list, &self.inner.name).await {
            Ok(id) => Ok(id),
            Err(e) => {
                tracing::warn!("Remote save of {} failed: {}", kind, e);
                Err(SyncError::RemoteSaveFailure(e.to_string()))
            }
        };

        if remote.is_ok() && trigger == Trigger::Debounce && self.inner.config.snapshot_on_autosave {
            if let Err(e) = self
                .inner
                .store
                .save_draft(kind, list, None, DraftMeta::auto())
            {
                tracing::warn!("Auto-draft of {} failed: {}", kind, e);
            }
        }

        if let Ok(id) = &remote {
            tracing::info!("Saved {} ({} items, remote id {})", kind, list.len(), id);
        }

        Ok(SaveReport { saved_at, remote })
    }

    fn finish_cycle(&self, saved: &[T], epoch: u64, outcome: &SaveResult) {
        let mut shared = self.lock();
        shared.in_flight = None;

        if shared.baseline_epoch != epoch {
            tracing::debug!("Baseline of {} reset during save, discarding its outcome", self.inner.kind);
        } else {
            apply_outcome(&mut shared, saved, outcome);
        }

        if std::mem::take(&mut shared.rearm_after_save) && shared.dirty {
            self.arm_timer(&mut shared);
        }
    }
}

fn apply_outcome<T: ListItem>(shared: &mut Shared<T>, saved: &[T], outcome: &SaveResult) {
    match outcome {
        Ok(SaveReport {
            saved_at,
            remote: Ok(_),
        }) => {
            shared.last_saved_at = Some(*saved_at);
            shared.last_error = None;
            // Edits made while saving are still unsaved.
            shared.dirty = shared.list.as_slice() != saved;
        }
        Ok(SaveReport {
            remote: Err(e), ..
        })
        | Err(e) => {
            shared.last_error = Some(e.to_string());
            shared.dirty = true;
        }
    }
}

async fn wait_for_outcome(mut rx: watch::Receiver<Option<SaveResult>>) -> SaveResult {
    match rx.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(Err(SyncError::Interrupted)),
        Err(_) => Err(SyncError::Interrupted),
    }
}
