//! Application layer for Neptune.
//!
//! This crate provides the store façade and the use cases that coordinate
//! the domain slices with the infrastructure adapters.

pub mod auth_service;
pub mod repo_service;
pub mod store;

pub use auth_service::AuthService;
pub use repo_service::RepoService;
pub use store::{NeptuneStore, StoreOptions};
