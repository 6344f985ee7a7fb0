//! Pure functions deriving lookup structures from a commit DAG.

use std::collections::{BTreeSet, HashMap};

use super::model::GitCommit;

/// Indexes a DAG by commit SHA.
///
/// When a SHA appears more than once the last occurrence wins.
pub fn build_index(dag: &[GitCommit]) -> HashMap<String, GitCommit> {
    dag.iter()
        .map(|commit| (commit.commit.clone(), commit.clone()))
        .collect()
}

/// Distinct author names found in a DAG, sorted.
pub fn authors_of(dag: &[GitCommit]) -> Vec<String> {
    dag.iter()
        .map(|commit| commit.author.trim())
        .filter(|author| !author.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha: &str, author: &str, message: &str) -> GitCommit {
        GitCommit {
            commit: sha.to_string(),
            parents: Vec::new(),
            branches: Vec::new(),
            author: author.to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
            message: message.to_string(),
            changed_files: Vec::new(),
        }
    }

    #[test]
    fn test_index_keys_match_dag_shas() {
        let dag = vec![commit("a", "A", "one"), commit("b", "B", "two")];
        let index = build_index(&dag);

        let mut keys: Vec<_> = index.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(index["b"], dag[1]);
    }

    #[test]
    fn test_index_of_empty_dag_is_empty() {
        assert!(build_index(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_sha_last_wins() {
        let dag = vec![commit("a", "A", "first"), commit("a", "A", "second")];
        let index = build_index(&dag);
        assert_eq!(index.len(), 1);
        assert_eq!(index["a"].message, "second");
    }

    #[test]
    fn test_authors_are_sorted_and_unique() {
        let dag = vec![
            commit("a", "Zed", "x"),
            commit("b", "Amy", "x"),
            commit("c", "Zed", "x"),
            commit("d", "  ", "x"),
        ];
        assert_eq!(authors_of(&dag), vec!["Amy", "Zed"]);
    }
}
