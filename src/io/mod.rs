// src/io/mod.rs
pub mod reader;
pub mod vector;
pub mod writer;

pub use reader::GeoInfo;
