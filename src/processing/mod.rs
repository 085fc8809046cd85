// src/processing/mod.rs
pub mod classify;
pub mod index;
pub mod sieve;

pub use classify::classify;
pub use index::NormalizedDifference;
pub use sieve::{sieve, Connectivity};

use crate::io::reader::GeoInfo;

/// Nodata sentinel for index rasters.
pub const NODATA: f32 = -999.0;

/// Float raster holding per-pixel normalized-difference values.
/// Pixels are either finite index values or [`NODATA`].
#[derive(Debug, Clone)]
pub struct IndexRaster {
    pub data: Vec<f32>,
    pub geo: GeoInfo,
}

impl IndexRaster {
    pub fn new(data: Vec<f32>, geo: GeoInfo) -> Self {
        debug_assert_eq!(data.len(), geo.pixel_count());
        Self { data, geo }
    }
}

/// Byte raster produced by classification and sieving. Values are
/// class labels; 0 is background.
#[derive(Debug, Clone)]
pub struct MaskRaster {
    pub data: Vec<u8>,
    pub geo: GeoInfo,
}

impl MaskRaster {
    pub fn new(data: Vec<u8>, geo: GeoInfo) -> Self {
        debug_assert_eq!(data.len(), geo.pixel_count());
        Self { data, geo }
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
