// src/error.rs
use thiserror::Error;

/// Failures raised by the processing pipeline.
///
/// Everything except GDAL passthrough errors maps to a specific stage:
/// shape and band checks are fatal to the tile, sieve/polygonize/write
/// failures are fatal to one threshold branch only.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("band dimensions differ: {0}x{1} vs {2}x{3}")]
    ShapeMismatch(usize, usize, usize, usize),

    #[error("band {band} is upper than {total} (total bands)")]
    BandIndexOutOfRange { band: usize, total: usize },

    #[error("sieve failed: {0}")]
    SieveFailure(String),

    #[error("polygonize failed: {0}")]
    PolygonizeFailure(String),

    #[error("output write failed: {0}")]
    OutputWriteFailure(String),

    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
}
