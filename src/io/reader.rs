// src/io/reader.rs
use std::path::Path;

use gdal::Dataset;

use crate::error::PipelineError;

/// Georeferencing carried unmodified from the source tile to every
/// derived raster and vector output.
#[derive(Debug, Clone)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let (width, height) = dataset.raster_size();
        // Ungeoreferenced test rasters fall back to an identity transform
        let geo_transform = dataset
            .geo_transform()
            .unwrap_or([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
        Self {
            projection: dataset.projection(),
            geo_transform,
            width,
            height,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

pub fn open_tile(path: &Path) -> Result<Dataset, PipelineError> {
    Ok(Dataset::open(path)?)
}
