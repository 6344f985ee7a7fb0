//! Local repository domain module.
//!
//! # Module Structure
//!
//! - `model`: `GitCommit`, `LocalRepo`
//! - `index`: pure derivations over a commit DAG
//! - `slice`: the keyed collection of local repos and its operations

mod index;
mod model;
mod slice;

pub use index::{authors_of, build_index};
pub use model::{GitCommit, LocalRepo, RepoId};
pub use slice::LocalReposSlice;
