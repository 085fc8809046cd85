// src/processing/index.rs
use gdal::raster::RasterBand;
use gdal::Dataset;

use crate::error::PipelineError;
use crate::io::reader::GeoInfo;
use crate::processing::{IndexRaster, NODATA};

/// Normalized Difference calculator: (B1 - B2) / (B1 + B2).
///
/// Band numbers are 1-based, matching GDAL. Input bands are read one
/// row at a time so memory stays proportional to the tile width.
pub struct NormalizedDifference {
    band1: usize,
    band2: usize,
}

impl NormalizedDifference {
    pub fn new(band1: usize, band2: usize) -> Self {
        Self { band1, band2 }
    }

    /// Computes the index raster for a source tile.
    ///
    /// Fails with `BandIndexOutOfRange` before touching any pixel data,
    /// with `ShapeMismatch` if the two bands disagree on dimensions.
    pub fn compute(&self, dataset: &Dataset) -> Result<IndexRaster, PipelineError> {
        let total = dataset.raster_count();
        for band in [self.band1, self.band2] {
            if band < 1 || band > total {
                return Err(PipelineError::BandIndexOutOfRange { band, total });
            }
        }

        let b1 = dataset.rasterband(self.band1)?;
        let b2 = dataset.rasterband(self.band2)?;
        let geo = GeoInfo::from_dataset(dataset);
        compute_from_bands(&b1, &b2, geo)
    }
}

/// Row-streaming index computation over two already-opened bands.
pub fn compute_from_bands(
    b1: &RasterBand,
    b2: &RasterBand,
    geo: GeoInfo,
) -> Result<IndexRaster, PipelineError> {
    let (w1, h1) = b1.size();
    let (w2, h2) = b2.size();
    if (w1, h1) != (w2, h2) {
        return Err(PipelineError::ShapeMismatch(w1, h1, w2, h2));
    }

    let mut data = vec![NODATA; w1 * h1];
    for y in 0..h1 {
        let row1 = b1.read_as::<f32>((0, y as isize), (w1, 1), (w1, 1), None)?;
        let row2 = b2.read_as::<f32>((0, y as isize), (w1, 1), (w1, 1), None)?;
        normalized_difference_row(row1.data(), row2.data(), &mut data[y * w1..(y + 1) * w1]);
    }

    Ok(IndexRaster::new(data, geo))
}

/// Pixelwise (v1 - v2) / (v1 + v2) over one row. A zero or non-finite
/// denominator yields [`NODATA`] instead of NaN/Inf.
pub fn normalized_difference_row(row1: &[f32], row2: &[f32], out: &mut [f32]) {
    for ((&v1, &v2), dst) in row1.iter().zip(row2).zip(out.iter_mut()) {
        let sum = v1 + v2;
        *dst = if sum == 0.0 || !sum.is_finite() {
            NODATA
        } else {
            (v1 - v2) / sum
        };
    }
}
