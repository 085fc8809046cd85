// src/utils/mod.rs
pub mod log;
