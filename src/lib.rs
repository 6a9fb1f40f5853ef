// Public API for integration tests and the CLI binary

pub mod api;
pub mod config;
pub mod error;
pub mod input;
pub mod protocol;
pub mod sync;
pub mod types;
pub mod view;
pub mod ws;
