pub mod auth;
pub mod config;
pub mod repo;
pub mod state;
pub mod ui;
