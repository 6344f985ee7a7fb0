//! UI state domain module.

mod model;

pub use model::UiSlice;
