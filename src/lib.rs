// src/lib.rs
pub mod batch;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod utils;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
