// vitrack_core/src/utils/mod.rs

pub mod exp_map;
pub mod validity;
