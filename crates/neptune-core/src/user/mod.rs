//! User domain module.
//!
//! # Usage
//!
//! ```ignore
//! use neptune_core::user::{Plan, User};
//! ```

mod model;

pub use model::{Plan, User};
