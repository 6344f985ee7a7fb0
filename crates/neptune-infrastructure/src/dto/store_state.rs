//! Persisted projection of the store state.

use std::collections::HashMap;

use neptune_core::repo::{GitCommit, LocalRepo, LocalReposSlice, RepoId};
use neptune_core::session::SessionSlice;
use neptune_core::state::StoreState;
use neptune_core::ui::UiSlice;
use neptune_core::user::{Plan, User};
use serde::{Deserialize, Serialize};

/// Schema version written next to the projection.
pub const STORE_SCHEMA_VERSION: u32 = 0;

/// `{ "state": …, "version": … }`, the value stored under the store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

impl StoredEnvelope {
    pub fn new(state: PersistedState) -> Self {
        Self {
            state,
            version: STORE_SCHEMA_VERSION,
        }
    }
}

/// The whitelisted subset of [`StoreState`] that survives a restart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub has_token: bool,
    #[serde(default)]
    pub local: HashMap<RepoId, PersistedRepo>,
    #[serde(default)]
    pub selected_repos: Vec<RepoId>,
    #[serde(default)]
    pub open_tabs: Vec<RepoId>,
    #[serde(default)]
    pub active_tab: Option<RepoId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRepo {
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default)]
    pub author_list: Vec<String>,
    #[serde(default)]
    pub is_watching: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_dag: Option<Vec<PersistedCommit>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCommit {
    pub commit: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub changed_files: Vec<String>,
}

impl From<&GitCommit> for PersistedCommit {
    fn from(commit: &GitCommit) -> Self {
        Self {
            commit: commit.commit.clone(),
            parents: commit.parents.clone(),
            branches: commit.branches.clone(),
            author: commit.author.clone(),
            date: commit.date.clone(),
            message: commit.message.clone(),
            changed_files: commit.changed_files.clone(),
        }
    }
}

impl From<PersistedCommit> for GitCommit {
    fn from(commit: PersistedCommit) -> Self {
        GitCommit {
            commit: commit.commit,
            parents: commit.parents,
            branches: commit.branches,
            author: commit.author,
            date: commit.date,
            message: commit.message,
            changed_files: commit.changed_files,
        }
    }
}

impl From<&LocalRepo> for PersistedRepo {
    fn from(repo: &LocalRepo) -> Self {
        Self {
            repo_name: repo.repo_name.clone(),
            local_path: repo.local_path.clone(),
            author_list: repo.author_list.clone(),
            is_watching: repo.is_watching,
            commit_dag: repo
                .commit_dag
                .as_ref()
                .map(|dag| dag.iter().map(PersistedCommit::from).collect()),
        }
    }
}

impl PersistedRepo {
    /// Restores the runtime repo and rebuilds its commit index.
    fn into_runtime(self) -> LocalRepo {
        let mut repo = LocalRepo::new(self.repo_name);
        repo.local_path = self.local_path;
        repo.author_list = self.author_list;
        repo.is_watching = self.is_watching;
        if let Some(dag) = self.commit_dag {
            repo.replace_dag(dag.into_iter().map(GitCommit::from).collect());
        }
        repo
    }
}

impl From<&StoreState> for PersistedState {
    fn from(state: &StoreState) -> Self {
        Self {
            user: state.session.user.clone(),
            plan: state.session.plan,
            has_token: state.session.has_token,
            local: state
                .repos
                .local
                .iter()
                .map(|(id, repo)| (id.clone(), PersistedRepo::from(repo)))
                .collect(),
            selected_repos: state.ui.selected_repos.clone(),
            open_tabs: state.ui.open_tabs.clone(),
            active_tab: state.ui.active_tab.clone(),
        }
    }
}

impl PersistedState {
    /// Rehydrates the runtime state.
    ///
    /// Every repo with a DAG gets its commit index rebuilt. A hand-edited or
    /// truncated file is repaired so the UI invariants hold: duplicate ids are
    /// dropped and a dangling `active_tab` falls back to the last open tab.
    pub fn into_runtime(self) -> StoreState {
        let session = SessionSlice {
            user: self.user,
            plan: self.plan,
            has_token: self.has_token,
        };

        let repos = LocalReposSlice {
            local: self
                .local
                .into_iter()
                .map(|(id, repo)| (id, repo.into_runtime()))
                .collect(),
        };

        let open_tabs = dedup(self.open_tabs);
        let active_tab = match self.active_tab {
            Some(active) if open_tabs.contains(&active) => Some(active),
            _ => open_tabs.last().cloned(),
        };
        let ui = UiSlice {
            selected_repos: dedup(self.selected_repos),
            open_tabs,
            active_tab,
        };

        StoreState { session, repos, ui }
    }
}

fn dedup(ids: Vec<RepoId>) -> Vec<RepoId> {
    let mut out: Vec<RepoId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
