//! UI slice: sidebar selection and the tab strip.

use serde::{Deserialize, Serialize};

use crate::error::{NeptuneError, Result};
use crate::repo::RepoId;

const ENTITY: &str = "tab";

/// Sidebar selection and open tabs.
///
/// Invariants:
/// - `selected_repos` holds no duplicates.
/// - `active_tab`, when set, is an element of `open_tabs`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSlice {
    pub selected_repos: Vec<RepoId>,
    pub open_tabs: Vec<RepoId>,
    pub active_tab: Option<RepoId>,
}

impl UiSlice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to the sidebar selection unless already selected.
    pub fn add_repo_to_ui(&mut self, id: impl Into<RepoId>) {
        let id = id.into();
        if !self.selected_repos.contains(&id) {
            self.selected_repos.push(id);
        }
    }

    /// Drops `id` from the selection and from the tab strip.
    pub fn remove_repo_from_ui(&mut self, id: &str) {
        self.selected_repos.retain(|r| r != id);
        self.remove_tab(id);
    }

    /// Appends `id` as a tab if it is not open yet, then activates it.
    pub fn open_tab(&mut self, id: impl Into<RepoId>) {
        let id = id.into();
        if !self.open_tabs.contains(&id) {
            self.open_tabs.push(id.clone());
        }
        self.active_tab = Some(id);
    }

    pub fn try_close_tab(&mut self, id: &str) -> Result<()> {
        if !self.is_open(id) {
            return Err(NeptuneError::not_found(ENTITY, id));
        }
        self.remove_tab(id);
        Ok(())
    }

    /// Closes `id`; if it was active the new last tab becomes active.
    pub fn close_tab(&mut self, id: &str) {
        self.remove_tab(id);
    }

    pub fn try_set_active(&mut self, id: &str) -> Result<()> {
        if !self.is_open(id) {
            return Err(NeptuneError::not_found(ENTITY, id));
        }
        self.active_tab = Some(id.to_string());
        Ok(())
    }

    /// Activates `id` only when it is already an open tab.
    pub fn set_active(&mut self, id: &str) {
        let _ = self.try_set_active(id);
    }

    /// Moves `id` to `new_index`.
    ///
    /// The index is interpreted against the strip with `id` removed and is
    /// clamped to its length, so anything past the end appends.
    pub fn try_move_tab(&mut self, id: &str, new_index: usize) -> Result<()> {
        let pos = self
            .open_tabs
            .iter()
            .position(|t| t == id)
            .ok_or_else(|| NeptuneError::not_found(ENTITY, id))?;
        let tab = self.open_tabs.remove(pos);
        let target = new_index.min(self.open_tabs.len());
        self.open_tabs.insert(target, tab);
        Ok(())
    }

    pub fn move_tab(&mut self, id: &str, new_index: usize) {
        let _ = self.try_move_tab(id, new_index);
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open_tabs.iter().any(|t| t == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_repos.iter().any(|r| r == id)
    }

    fn remove_tab(&mut self, id: &str) {
        self.open_tabs.retain(|t| t != id);
        if self.active_tab.as_deref() == Some(id) {
            self.active_tab = self.open_tabs.last().cloned();
        }
    }
}
