//! Combined store state.
//!
//! Contains the runtime state that the store façade owns: the three slices
//! side by side.

use serde::{Deserialize, Serialize};

use crate::repo::LocalReposSlice;
use crate::session::SessionSlice;
use crate::ui::UiSlice;

/// Everything the store holds in memory.
///
/// This is the runtime type. What reaches disk is a projection of it defined
/// by the infrastructure DTOs, which leave out every derived index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub session: SessionSlice,
    pub repos: LocalReposSlice,
    pub ui: UiSlice,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }
}
