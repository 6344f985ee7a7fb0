//! Loads commit history into the store.

use std::path::Path;
use std::sync::Arc;

use neptune_core::error::{NeptuneError, Result};
use neptune_core::repo::authors_of;
use neptune_infrastructure::GitLogReader;

use crate::store::NeptuneStore;

pub struct RepoService {
    store: Arc<NeptuneStore>,
    git: GitLogReader,
}

impl RepoService {
    pub fn new(store: Arc<NeptuneStore>, git: GitLogReader) -> Self {
        Self { store, git }
    }

    /// Reads the DAG of a linked repo and replaces the stored one.
    ///
    /// The author list is refreshed from the same DAG. Returns the number of
    /// commits loaded.
    pub async fn load_dag(&self, id: &str) -> Result<usize> {
        let repo = self
            .store
            .repo(id)
            .ok_or_else(|| NeptuneError::not_found("repo", id))?;
        let path = repo
            .local_path
            .ok_or_else(|| NeptuneError::config(format!("Repo '{}' has no linked path", id)))?;

        let dag = self.git.read_dag(Path::new(&path)).await?;
        let count = dag.len();
        let authors = authors_of(&dag);

        self.store.set_dag(id, dag)?;
        self.store.set_author_list(id, authors)?;
        tracing::info!(repo = %id, commits = count, "Loaded commit DAG");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreOptions;
    use neptune_infrastructure::MemoryKeyValueStore;

    async fn service() -> (Arc<NeptuneStore>, RepoService) {
        let store = Arc::new(
            NeptuneStore::init(Arc::new(MemoryKeyValueStore::new()), StoreOptions::default()).await,
        );
        let service = RepoService::new(
            store.clone(),
            GitLogReader::with_git("git-binary-that-does-not-exist"),
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_unknown_repo_is_not_found() {
        let (_store, service) = service().await;
        assert!(service.load_dag("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unlinked_repo_is_a_config_error() {
        let (store, service) = service().await;
        store.add_repo("r1", "neptune");

        let err = service.load_dag("r1").await.unwrap_err();
        assert!(matches!(err, NeptuneError::Config(_)));
    }

    #[tokio::test]
    async fn test_git_failure_leaves_dag_untouched() {
        let (store, service) = service().await;
        store.add_repo("r1", "neptune");
        store.link_path("r1", "/nonexistent").unwrap();

        assert!(service.load_dag("r1").await.unwrap_err().is_io());
        assert!(store.repo("r1").unwrap().commit_dag.is_none());
    }
}
