// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ndwi-extract")]
#[command(about = "Normalized difference and classification - (B1 - B2) / (B1 + B2)")]
pub struct Cli {
    /// Path of the input tile image
    pub pathfile: PathBuf,

    /// Number of band 1 (1-based)
    pub band1: usize,

    /// Number of band 2 (1-based)
    pub band2: usize,

    /// Threshold values separated by comma (e.g. "0,0.01,0.005")
    pub thresholds: String,

    /// Minimum region size in pixels for the area-filtered outputs
    pub min_pixels: usize,

    /// Directory for the result files
    pub out_dir: PathBuf,
}

/// Parses the comma-separated threshold list. Duplicates and unsorted
/// values are allowed; each is processed independently.
pub fn parse_thresholds(list: &str) -> Result<Vec<f32>, String> {
    list.split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid threshold '{}': {}", v.trim(), e))
        })
        .collect()
}
