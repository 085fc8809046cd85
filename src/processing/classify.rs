// src/processing/classify.rs
use rayon::prelude::*;

use crate::error::PipelineError;
use crate::processing::{IndexRaster, MaskRaster, NODATA};

/// Classifies an index raster against a scalar threshold.
///
/// Output pixel is 1 iff `index >= threshold`; nodata pixels classify
/// as 0. The shape check is defensive, a well-formed raster cannot
/// trip it.
pub fn classify(index: &IndexRaster, threshold: f32) -> Result<MaskRaster, PipelineError> {
    if index.data.len() != index.geo.pixel_count() {
        return Err(PipelineError::ShapeMismatch(
            index.geo.width,
            index.geo.height,
            index.data.len(),
            1,
        ));
    }

    let data: Vec<u8> = index
        .data
        .par_iter()
        .map(|&v| if v != NODATA && v >= threshold { 1 } else { 0 })
        .collect();

    Ok(MaskRaster::new(data, index.geo.clone()))
}
