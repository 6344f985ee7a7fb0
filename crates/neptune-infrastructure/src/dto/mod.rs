//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the on-disk schema of the store projection. They are kept
//! apart from the runtime types so derived data (the commit index) and
//! transient data never reach the file.
//!
//! ### Store Version History
//! - **0**: `{ user, plan, hasToken, local, selectedRepos, openTabs, activeTab }`
//!   wrapped in `{ "state": …, "version": 0 }`

mod store_state;

pub use store_state::{
    PersistedCommit, PersistedRepo, PersistedState, STORE_SCHEMA_VERSION, StoredEnvelope,
};
