// vitrack_core/src/lib.rs

pub mod config;
pub mod error;
pub mod estimation;
pub mod messages;
pub mod models;
pub mod prelude;
pub mod state;
pub mod types;
pub mod utils;
