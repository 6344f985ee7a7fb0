//! Domain layer for Neptune.
//!
//! Holds the three state slices (session, local repositories, UI), the
//! combined runtime state, the configuration models, and the traits the
//! outer layers implement for persistence and authentication.

pub mod auth;
pub mod config;
pub mod error;
pub mod repo;
pub mod session;
pub mod state;
pub mod ui;
pub mod user;

// Re-export common error type
pub use error::NeptuneError;
