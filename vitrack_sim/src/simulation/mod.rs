pub mod config;
pub mod prng;
pub mod runner;
pub mod sensors;
pub mod state_error;
pub mod truth;
pub mod utils;
