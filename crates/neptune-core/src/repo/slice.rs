//! Local repositories slice.
//!
//! Every id-taking mutation comes in two flavours: a `try_*` method that
//! reports an unknown id as [`NeptuneError::NotFound`], and a lenient method
//! that ignores it. The lenient ones are what the store exposes by default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::{GitCommit, LocalRepo, RepoId};
use crate::error::{NeptuneError, Result};

const ENTITY: &str = "repo";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalReposSlice {
    pub local: HashMap<RepoId, LocalRepo>,
}

impl LocalReposSlice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new repo record unless `id` is already present.
    ///
    /// Returns `true` when a record was inserted.
    pub fn add_repo(&mut self, id: impl Into<RepoId>, name: impl Into<String>) -> bool {
        let id = id.into();
        if self.local.contains_key(&id) {
            return false;
        }
        self.local.insert(id, LocalRepo::new(name));
        true
    }

    pub fn try_link_path(&mut self, id: &str, path: impl Into<String>) -> Result<()> {
        self.repo_mut(id)?.local_path = Some(path.into());
        Ok(())
    }

    pub fn link_path(&mut self, id: &str, path: impl Into<String>) {
        let _ = self.try_link_path(id, path);
    }

    /// Replaces the commit DAG of `id` and rebuilds its commit index.
    pub fn try_set_dag(&mut self, id: &str, dag: Vec<GitCommit>) -> Result<()> {
        self.repo_mut(id)?.replace_dag(dag);
        Ok(())
    }

    pub fn set_dag(&mut self, id: &str, dag: Vec<GitCommit>) {
        let _ = self.try_set_dag(id, dag);
    }

    pub fn try_set_author_list(&mut self, id: &str, authors: Vec<String>) -> Result<()> {
        self.repo_mut(id)?.author_list = authors;
        Ok(())
    }

    pub fn set_author_list(&mut self, id: &str, authors: Vec<String>) {
        let _ = self.try_set_author_list(id, authors);
    }

    pub fn try_set_watching(&mut self, id: &str, on: bool) -> Result<()> {
        self.repo_mut(id)?.is_watching = on;
        Ok(())
    }

    pub fn set_watching(&mut self, id: &str, on: bool) {
        let _ = self.try_set_watching(id, on);
    }

    /// O(1) commit lookup through the derived index.
    pub fn get_commit(&self, id: &str, sha: &str) -> Option<&GitCommit> {
        self.local.get(id)?.commit(sha)
    }

    pub fn repo(&self, id: &str) -> Option<&LocalRepo> {
        self.local.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.local.contains_key(id)
    }

    /// Repo ids in sorted order.
    pub fn ids(&self) -> Vec<RepoId> {
        let mut ids: Vec<_> = self.local.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    /// Rebuilds every commit index from its DAG.
    pub fn rebuild_indexes(&mut self) {
        for repo in self.local.values_mut() {
            repo.rebuild_index();
        }
    }

    fn repo_mut(&mut self, id: &str) -> Result<&mut LocalRepo> {
        self.local
            .get_mut(id)
            .ok_or_else(|| NeptuneError::not_found(ENTITY, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, parents: &[&str]) -> GitCommit {
        GitCommit {
            commit: sha.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            branches: vec!["main".to_string()],
            author: "A".to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
            message: "init".to_string(),
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn test_add_repo_is_idempotent() {
        let mut slice = LocalReposSlice::new();
        assert!(slice.add_repo("r1", "Demo"));
        slice.set_watching("r1", true);

        assert!(!slice.add_repo("r1", "Renamed"));

        let repo = slice.repo("r1").unwrap();
        assert_eq!(repo.repo_name, "Demo");
        assert!(repo.is_watching);
        assert_eq!(slice.len(), 1);
    }

    #[test]
    fn test_get_commit_example_scenario() {
        let mut slice = LocalReposSlice::new();
        slice.add_repo("r1", "Demo");
        let init = commit("a", &[]);
        slice.set_dag("r1", vec![init.clone()]);

        assert_eq!(slice.get_commit("r1", "a"), Some(&init));
        assert_eq!(slice.get_commit("r1", "zzz"), None);
        assert_eq!(slice.get_commit("unknown", "a"), None);
    }

    #[test]
    fn test_set_dag_discards_previous_commits() {
        let mut slice = LocalReposSlice::new();
        slice.add_repo("r1", "Demo");
        slice.set_dag("r1", vec![commit("a", &[]), commit("b", &["a"])]);

        slice.set_dag("r1", vec![commit("c", &[])]);

        assert!(slice.get_commit("r1", "a").is_none());
        assert!(slice.get_commit("r1", "b").is_none());
        assert!(slice.get_commit("r1", "c").is_some());
        assert_eq!(slice.repo("r1").unwrap().commit_count(), 1);
    }

    #[test]
    fn test_set_dag_twice_with_same_input_is_stable() {
        let dag = vec![commit("a", &[]), commit("b", &["a"])];
        let mut slice = LocalReposSlice::new();
        slice.add_repo("r1", "Demo");

        slice.set_dag("r1", dag.clone());
        let first = slice.repo("r1").unwrap().clone();
        slice.set_dag("r1", dag);

        assert_eq!(slice.repo("r1").unwrap(), &first);
    }

    #[test]
    fn test_lenient_operations_ignore_unknown_id() {
        let mut slice = LocalReposSlice::new();
        slice.link_path("ghost", "/tmp/ghost");
        slice.set_dag("ghost", vec![commit("a", &[])]);
        slice.set_author_list("ghost", vec!["A".to_string()]);
        slice.set_watching("ghost", true);

        assert!(slice.is_empty());
    }

    #[test]
    fn test_strict_operations_report_unknown_id() {
        let mut slice = LocalReposSlice::new();

        let err = slice.try_link_path("ghost", "/tmp").unwrap_err();
        assert!(err.is_not_found());
        assert!(slice.try_set_dag("ghost", Vec::new()).unwrap_err().is_not_found());
        assert!(slice.try_set_author_list("ghost", Vec::new()).is_err());
        assert!(slice.try_set_watching("ghost", false).is_err());
    }

    #[test]
    fn test_field_setters() {
        let mut slice = LocalReposSlice::new();
        slice.add_repo("r1", "Demo");
        slice.link_path("r1", "/work/demo");
        slice.set_author_list("r1", vec!["A".to_string(), "B".to_string()]);
        slice.set_watching("r1", true);

        let repo = slice.repo("r1").unwrap();
        assert_eq!(repo.local_path.as_deref(), Some("/work/demo"));
        assert_eq!(repo.author_list, vec!["A", "B"]);
        assert!(repo.is_watching);
    }

    #[test]
    fn test_rebuild_indexes_restores_lookups() {
        let mut slice = LocalReposSlice::new();
        slice.add_repo("r1", "Demo");
        slice.add_repo("r2", "Empty");
        slice.set_dag("r1", vec![commit("a", &[])]);
        for repo in slice.local.values_mut() {
            repo.commit_map = None;
        }
        assert!(slice.get_commit("r1", "a").is_none());

        slice.rebuild_indexes();

        assert!(slice.get_commit("r1", "a").is_some());
        assert!(slice.repo("r2").unwrap().commit_map.is_none());
    }

    #[test]
    fn test_get_commit_matches_latest_dag_over_sequences() {
        // Interleave adds and DAG replacements across repos; every lookup must
        // agree with a linear scan of the most recent DAG for that repo.
        let mut slice = LocalReposSlice::new();
        let mut latest: HashMap<String, Vec<GitCommit>> = HashMap::new();
        let steps: Vec<(&str, Vec<&str>)> = vec![
            ("r1", vec!["a", "b"]),
            ("r2", vec!["c"]),
            ("r1", vec!["b", "d"]),
            ("r3", vec![]),
            ("r2", vec!["a", "c", "e"]),
        ];

        for (id, shas) in steps {
            slice.add_repo(id, id.to_uppercase());
            let dag: Vec<_> = shas.iter().map(|sha| commit(sha, &[])).collect();
            slice.set_dag(id, dag.clone());
            latest.insert(id.to_string(), dag);

            for repo_id in ["r1", "r2", "r3", "r4"] {
                for sha in ["a", "b", "c", "d", "e", "zzz"] {
                    let expected = latest
                        .get(repo_id)
                        .and_then(|dag| dag.iter().find(|c| c.commit == sha));
                    assert_eq!(slice.get_commit(repo_id, sha), expected);
                }
            }
        }
    }
}
