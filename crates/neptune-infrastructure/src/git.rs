//! Reads repository history and settings through the `git` CLI.

use std::path::{Path, PathBuf};

use neptune_core::error::{NeptuneError, Result};
use neptune_core::repo::GitCommit;
use tokio::process::Command;

const RECORD_SEPARATOR: char = '\u{1e}';
const FIELD_SEPARATOR: char = '\u{1f}';

/// `%H %P %D %an %aI %s`, one record per commit, fields unit-separated.
const LOG_FORMAT: &str = "--format=%x1e%H%x1f%P%x1f%D%x1f%an%x1f%aI%x1f%s";

/// Builds commit DAGs from `git log`.
#[derive(Debug, Clone)]
pub struct GitLogReader {
    git: PathBuf,
}

impl Default for GitLogReader {
    fn default() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }
}

impl GitLogReader {
    /// Uses a specific git executable instead of the one on `PATH`.
    pub fn with_git(git: impl Into<PathBuf>) -> Self {
        Self { git: git.into() }
    }

    /// Every commit reachable from any ref, children before parents.
    pub async fn read_dag(&self, repo_path: &Path) -> Result<Vec<GitCommit>> {
        let output = Command::new(&self.git)
            .arg("-C")
            .arg(repo_path)
            .args(["log", "--all", "--topo-order", "--name-only", LOG_FORMAT])
            .output()
            .await
            .map_err(|e| NeptuneError::io(format!("Failed to run git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NeptuneError::io(format!(
                "git log failed in {}: {}",
                repo_path.display(),
                stderr.trim()
            )));
        }

        let commits = parse_git_log(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(path = %repo_path.display(), commits = commits.len(), "Read commit DAG");
        Ok(commits)
    }

    /// `git config --get <key>`, `None` when unset or git is unavailable.
    pub async fn config_value(&self, key: &str) -> Option<String> {
        let output = Command::new(&self.git)
            .args(["config", "--get", key])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let value = String::from_utf8(output.stdout).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Parses the output of `git log` run with [`LOG_FORMAT`] and `--name-only`.
///
/// Records with fewer than six fields are skipped.
pub fn parse_git_log(output: &str) -> Vec<GitCommit> {
    output
        .split(RECORD_SEPARATOR)
        .filter_map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Option<GitCommit> {
    let mut lines = record.lines();
    let header = lines.next()?;
    let fields: Vec<&str> = header.splitn(6, FIELD_SEPARATOR).collect();
    let [sha, parents, refs, author, date, message] = fields.as_slice() else {
        return None;
    };
    if sha.is_empty() {
        return None;
    }

    Some(GitCommit {
        commit: sha.to_string(),
        parents: parents.split_whitespace().map(str::to_string).collect(),
        branches: branches_from_decoration(refs),
        author: author.to_string(),
        date: date.to_string(),
        message: message.to_string(),
        changed_files: lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Branch names from a `%D` decoration such as `HEAD -> main, origin/main, tag: v1`.
fn branches_from_decoration(refs: &str) -> Vec<String> {
    refs.split(", ")
        .map(str::trim)
        .map(|r| r.strip_prefix("HEAD -> ").unwrap_or(r))
        .filter(|r| !r.is_empty() && *r != "HEAD" && !r.starts_with("tag: "))
        .map(str::to_string)
        .collect()
}
