//! Local repository domain models.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::index::build_index;

/// Opaque repository identifier used as the key of every repo-keyed map.
pub type RepoId = String;

/// One node of a commit DAG.
///
/// Commits are immutable once placed in a DAG; a DAG is always replaced as a
/// whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    /// Commit SHA
    pub commit: String,
    pub parents: Vec<String>,
    pub branches: Vec<String>,
    pub author: String,
    /// ISO-8601 author date
    pub date: String,
    pub message: String,
    #[serde(default)]
    pub changed_files: Vec<String>,
}

impl GitCommit {
    /// Parses `date` as RFC 3339. Returns `None` for malformed dates.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// A repository the user has added to Neptune.
///
/// `commit_map` is a derived index over `commit_dag`. It is rebuilt in full
/// whenever the DAG is replaced and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRepo {
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_dag: Option<Vec<GitCommit>>,
    #[serde(skip)]
    pub commit_map: Option<HashMap<String, GitCommit>>,
    #[serde(default)]
    pub author_list: Vec<String>,
    #[serde(default)]
    pub is_watching: bool,
}

impl LocalRepo {
    pub fn new(repo_name: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
            local_path: None,
            commit_dag: None,
            commit_map: None,
            author_list: Vec::new(),
            is_watching: false,
        }
    }

    /// Replaces the DAG and rebuilds the index from it.
    pub fn replace_dag(&mut self, dag: Vec<GitCommit>) {
        self.commit_map = Some(build_index(&dag));
        self.commit_dag = Some(dag);
    }

    /// Recomputes `commit_map` from `commit_dag`, clearing it when there is no DAG.
    pub fn rebuild_index(&mut self) {
        self.commit_map = self.commit_dag.as_deref().map(build_index);
    }

    pub fn commit(&self, sha: &str) -> Option<&GitCommit> {
        self.commit_map.as_ref()?.get(sha)
    }

    pub fn commit_count(&self) -> usize {
        self.commit_dag.as_ref().map_or(0, Vec::len)
    }

    /// The newest commit by author date. Commits with unparseable dates are ignored.
    pub fn latest_commit(&self) -> Option<&GitCommit> {
        self.commit_dag
            .as_ref()?
            .iter()
            .filter_map(|c| c.timestamp().map(|ts| (ts, c)))
            .max_by_key(|(ts, _)| *ts)
            .map(|(_, c)| c)
    }
}
