//! The store façade.
//!
//! `NeptuneStore` composes the session, local repositories and UI slices into
//! one container. Mutations are synchronous and visible as soon as they
//! return. After each one a projection of the state is queued for a single
//! background writer, which mirrors it into the key-value adapter in order.
//!
//! # Persistence
//!
//! - The projection is [`StoredEnvelope`] under [`StoreOptions::key`].
//! - Write failures are logged and dropped; memory stays authoritative.
//! - [`NeptuneStore::flush`] waits until every queued write has been handed
//!   to the adapter.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use neptune_core::config::{DEFAULT_STORE_KEY, StoreSettings};
use neptune_core::error::Result;
use neptune_core::repo::{GitCommit, LocalRepo, LocalReposSlice};
use neptune_core::session::SessionSlice;
use neptune_core::state::{KeyValueStore, StoreState};
use neptune_core::ui::UiSlice;
use neptune_core::user::{Plan, User};
use neptune_infrastructure::dto::{PersistedState, STORE_SCHEMA_VERSION, StoredEnvelope};
use tokio::sync::{mpsc, oneshot};

/// How a store is wired to its persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Key the projection is stored under.
    pub key: String,
    /// Report operations on unknown ids as `NotFound` instead of ignoring them.
    pub strict: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORE_KEY.to_string(),
            strict: false,
        }
    }
}

impl From<&StoreSettings> for StoreOptions {
    fn from(settings: &StoreSettings) -> Self {
        Self {
            key: settings.key.clone(),
            strict: settings.strict,
        }
    }
}

enum WriteCommand {
    Persist(Box<StoredEnvelope>),
    Flush(oneshot::Sender<()>),
}

pub struct NeptuneStore {
    state: RwLock<StoreState>,
    options: StoreOptions,
    writer: mpsc::UnboundedSender<WriteCommand>,
}

impl NeptuneStore {
    /// Rehydrates the persisted projection and starts the writer task.
    ///
    /// Missing or undecodable data starts the store from defaults.
    pub async fn init(kv: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let state = rehydrate(kv.as_ref(), &options.key).await;
        tracing::info!(
            key = %options.key,
            repos = state.repos.len(),
            strict = options.strict,
            "Store initialised"
        );

        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(kv, options.key.clone(), rx));

        Self {
            state: RwLock::new(state),
            options,
            writer,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Waits until every mutation made so far has been written.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.writer.send(WriteCommand::Flush(done)).is_err() {
            return;
        }
        let _ = wait.await;
    }

    // ============================================================================
    // Reads
    // ============================================================================

    /// Runs `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.read_state())
    }

    pub fn snapshot(&self) -> StoreState {
        self.read_state().clone()
    }

    pub fn session_view(&self) -> SessionSlice {
        self.read_state().session.clone()
    }

    pub fn local_repos_view(&self) -> LocalReposSlice {
        self.read_state().repos.clone()
    }

    pub fn ui_view(&self) -> UiSlice {
        self.read_state().ui.clone()
    }

    pub fn repo(&self, id: &str) -> Option<LocalRepo> {
        self.read_state().repos.repo(id).cloned()
    }

    /// Indexed lookup of one commit of one repo.
    pub fn get_commit(&self, id: &str, sha: &str) -> Option<GitCommit> {
        self.read_state().repos.get_commit(id, sha).cloned()
    }

    // ============================================================================
    // Session
    // ============================================================================

    pub fn set_user(&self, user: Option<User>) {
        self.apply(|state| session_changed(state, |session| session.set_user(user)));
    }

    pub fn set_plan(&self, plan: Plan) {
        self.apply(|state| session_changed(state, |session| session.set_plan(plan)));
    }

    pub fn set_has_token(&self, has_token: bool) {
        self.apply(|state| session_changed(state, |session| session.set_has_token(has_token)));
    }

    /// Signs the session out: no user, free plan, no token.
    pub fn clear_session(&self) {
        self.apply(|state| session_changed(state, SessionSlice::clear));
    }

    // ============================================================================
    // Local repositories
    // ============================================================================

    /// Returns `false` when `id` was already registered; the record is kept.
    pub fn add_repo(&self, id: &str, name: &str) -> bool {
        self.apply(|state| state.repos.add_repo(id, name))
    }

    pub fn link_path(&self, id: &str, path: &str) -> Result<()> {
        self.apply_checked(id, |state| state.repos.try_link_path(id, path).map(|()| true))
    }

    pub fn set_dag(&self, id: &str, dag: Vec<GitCommit>) -> Result<()> {
        self.apply_checked(id, |state| state.repos.try_set_dag(id, dag).map(|()| true))
    }

    pub fn set_author_list(&self, id: &str, authors: Vec<String>) -> Result<()> {
        self.apply_checked(id, |state| {
            state.repos.try_set_author_list(id, authors).map(|()| true)
        })
    }

    pub fn set_watching(&self, id: &str, on: bool) -> Result<()> {
        self.apply_checked(id, |state| state.repos.try_set_watching(id, on).map(|()| true))
    }

    // ============================================================================
    // UI
    // ============================================================================

    pub fn add_repo_to_ui(&self, id: &str) {
        self.apply(|state| ui_changed(state, |ui| ui.add_repo_to_ui(id)));
    }

    pub fn remove_repo_from_ui(&self, id: &str) {
        self.apply(|state| ui_changed(state, |ui| ui.remove_repo_from_ui(id)));
    }

    pub fn open_tab(&self, id: &str) {
        self.apply(|state| ui_changed(state, |ui| ui.open_tab(id)));
    }

    pub fn close_tab(&self, id: &str) -> Result<()> {
        self.apply_checked(id, |state| try_ui_changed(state, |ui| ui.try_close_tab(id)))
    }

    pub fn set_active(&self, id: &str) -> Result<()> {
        self.apply_checked(id, |state| try_ui_changed(state, |ui| ui.try_set_active(id)))
    }

    /// Moves an open tab; `new_index` past the end places it last.
    pub fn move_tab(&self, id: &str, new_index: usize) -> Result<()> {
        self.apply_checked(id, |state| try_ui_changed(state, |ui| ui.try_move_tab(id, new_index)))
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a mutation that reports whether it changed anything.
    ///
    /// Only changes are persisted.
    fn apply(&self, f: impl FnOnce(&mut StoreState) -> bool) -> bool {
        let mut state = self.write_state();
        let changed = f(&mut state);
        if changed {
            // Queued under the lock so writes reach the adapter in mutation order
            self.enqueue(&state);
        }
        changed
    }

    /// Applies a mutation that may hit an unknown id.
    ///
    /// A failed mutation leaves the state untouched and is not persisted. In
    /// lenient mode a `NotFound` is swallowed.
    fn apply_checked(&self, id: &str, f: impl FnOnce(&mut StoreState) -> Result<bool>) -> Result<()> {
        let outcome = {
            let mut state = self.write_state();
            let outcome = f(&mut state);
            if let Ok(true) = outcome {
                self.enqueue(&state);
            }
            outcome.map(|_| ())
        };

        match outcome {
            Err(e) if e.is_not_found() && !self.options.strict => {
                tracing::debug!(id = %id, error = %e, "Ignoring operation on unknown id");
                Ok(())
            }
            other => other,
        }
    }

    fn enqueue(&self, state: &StoreState) {
        let envelope = StoredEnvelope::new(PersistedState::from(state));
        if self.writer.send(WriteCommand::Persist(Box::new(envelope))).is_err() {
            tracing::error!("Store writer has stopped; change kept in memory only");
        }
    }
}

fn session_changed(state: &mut StoreState, f: impl FnOnce(&mut SessionSlice)) -> bool {
    let before = state.session.clone();
    f(&mut state.session);
    state.session != before
}

fn ui_changed(state: &mut StoreState, f: impl FnOnce(&mut UiSlice)) -> bool {
    let before = state.ui.clone();
    f(&mut state.ui);
    state.ui != before
}

fn try_ui_changed(state: &mut StoreState, f: impl FnOnce(&mut UiSlice) -> Result<()>) -> Result<bool> {
    let before = state.ui.clone();
    f(&mut state.ui)?;
    Ok(state.ui != before)
}

async fn rehydrate(kv: &dyn KeyValueStore, key: &str) -> StoreState {
    let value = match kv.get(key).await {
        Ok(Some(value)) => value,
        Ok(None) => return StoreState::default(),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to read persisted store");
            return StoreState::default();
        }
    };

    match serde_json::from_value::<StoredEnvelope>(value) {
        Ok(envelope) => {
            if envelope.version != STORE_SCHEMA_VERSION {
                tracing::warn!(
                    found = envelope.version,
                    expected = STORE_SCHEMA_VERSION,
                    "Persisted store has an unknown version, loading anyway"
                );
            }
            envelope.state.into_runtime()
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Persisted store is undecodable, starting fresh");
            StoreState::default()
        }
    }
}

async fn run_writer(
    kv: Arc<dyn KeyValueStore>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Persist(envelope) => {
                let value = match serde_json::to_value(&*envelope) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode store projection");
                        continue;
                    }
                };
                if let Err(e) = kv.set(&key, value).await {
                    tracing::error!(key = %key, error = %e, "Failed to persist store");
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Store writer stopped");
}
