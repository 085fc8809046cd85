// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::io::reader::open_tile;
use crate::io::vector::{polygonize, save_shapefile};
use crate::io::writer::write_index_raster;
use crate::processing::{classify, sieve, Connectivity, IndexRaster, NormalizedDifference};
use crate::utils::log::RunLog;

/// Minimum region size of the unfiltered branch. Still removes
/// single-pixel noise while keeping everything else.
const UNFILTERED_MIN_PIXELS: usize = 2;

#[derive(Debug, Clone)]
pub struct BatchParams {
    pub band1: usize,
    pub band2: usize,
    pub thresholds: Vec<f32>,
    pub min_pixels: usize,
    pub out_dir: PathBuf,
}

/// Outcome of one tile: empty `failures` means every threshold branch
/// completed. The first entry is what the run log shows.
#[derive(Debug)]
pub struct TileReport {
    pub tile: PathBuf,
    pub failures: Vec<String>,
}

impl TileReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives the classify/sieve/polygonize sequence over a batch of
/// tiles. Tiles and threshold branches are processed strictly
/// sequentially; a failing unit is recorded and the batch moves on.
pub struct BatchPipeline {
    params: BatchParams,
}

impl BatchPipeline {
    pub fn new(params: BatchParams) -> Self {
        Self { params }
    }

    pub fn run(&self, tile_paths: &[PathBuf], log: &mut RunLog) -> Vec<TileReport> {
        let mut reports = Vec::with_capacity(tile_paths.len());
        for path in tile_paths {
            let name = tile_name(path);
            let failures = self.process_tile(path, &name);
            match failures.first() {
                None => log.line(&format!("{name} - OK")),
                Some(first) => log.line(&format!("{name} - {first}")),
            }
            reports.push(TileReport {
                tile: path.clone(),
                failures,
            });
        }
        reports
    }

    /// Runs one tile end to end. Tile-level failures (open, band
    /// check, index computation, index output) abort the tile;
    /// threshold-branch failures are recorded and the remaining
    /// thresholds still run.
    fn process_tile(&self, path: &Path, name: &str) -> Vec<String> {
        let mut failures = Vec::new();

        let index = {
            // Source handle is released as soon as the index is computed.
            let dataset = match open_tile(path) {
                Ok(dataset) => dataset,
                Err(e) => return vec![e.to_string()],
            };
            let calc = NormalizedDifference::new(self.params.band1, self.params.band2);
            match calc.compute(&dataset) {
                Ok(index) => index,
                Err(e) => return vec![e.to_string()],
            }
        };

        let tile_dir = self.params.out_dir.join(tile_id(name));
        if let Err(e) = fs::create_dir_all(&tile_dir) {
            return vec![PipelineError::OutputWriteFailure(format!(
                "{}: {}",
                tile_dir.display(),
                e
            ))
            .to_string()];
        }

        let base = format!("{name}_ndwi_B{}B{}", self.params.band1, self.params.band2);
        if let Err(e) = write_index_raster(&index, &tile_dir.join(format!("{base}.tif"))) {
            return vec![e.to_string()];
        }

        for &threshold in &self.params.thresholds {
            let tag = threshold_tag(threshold);

            let unfiltered = tile_dir.join(format!("{base}_{tag}.shp"));
            if let Err(e) = self.threshold_branch(
                &index,
                threshold,
                UNFILTERED_MIN_PIXELS,
                Connectivity::Eight,
                &unfiltered,
            ) {
                failures.push(format!("Limit '{threshold}' - {e}"));
            }

            let filtered = tile_dir.join(format!("{base}_{tag}_{}px.shp", self.params.min_pixels));
            if let Err(e) = self.threshold_branch(
                &index,
                threshold,
                self.params.min_pixels,
                Connectivity::Four,
                &filtered,
            ) {
                failures.push(format!(
                    "Limit '{threshold}' - {} pixels - {e}",
                    self.params.min_pixels
                ));
            }
        }

        failures
    }

    fn threshold_branch(
        &self,
        index: &IndexRaster,
        threshold: f32,
        min_pixels: usize,
        connectivity: Connectivity,
        out_path: &Path,
    ) -> Result<(), PipelineError> {
        let mask = classify(index, threshold)?;
        let cleaned = sieve(&mask, min_pixels, connectivity)?;
        let layer_name = out_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mask".to_string());
        let vectors = polygonize(&cleaned, connectivity, &layer_name)?;
        save_shapefile(&vectors, out_path)
    }
}

/// Tile name is the source file name without its extension.
pub fn tile_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Tiles group into a directory named by the leading token of the tile
/// name (Sentinel-style `TILEID_rest` naming).
pub fn tile_id(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

/// Encodes a threshold for output file names: sign prefix `p`/`n`/`o`
/// (positive/negative/zero), absolute value to 3 decimals, `.`
/// replaced by `_`. E.g. 0.01 -> "p0_010", -0.5 -> "n0_500".
pub fn threshold_tag(threshold: f32) -> String {
    let sign = if threshold == 0.0 {
        'o'
    } else if threshold < 0.0 {
        'n'
    } else {
        'p'
    };
    format!("{sign}{:.3}", threshold.abs()).replace('.', "_")
}
