//! Session slice: who is signed in and on which plan.

use serde::{Deserialize, Serialize};

use crate::user::{Plan, User};

/// Authentication state held by the store.
///
/// `has_token` mirrors whether a credential could be loaded from the
/// credential store at the time it was last set. The two are not linked
/// transactionally and can drift; the auth use case resynchronises them on
/// every auto-login.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlice {
    pub user: Option<User>,
    pub plan: Plan,
    pub has_token: bool,
}

impl SessionSlice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current user. Fields are not merged.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
    }

    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
    }

    pub fn set_has_token(&mut self, has_token: bool) {
        self.has_token = has_token;
    }

    /// Resets user, plan and token flag to their defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.has_token
    }
}
