// src/main.rs
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ndwi_extract::batch::{BatchParams, BatchPipeline};
use ndwi_extract::cli::{parse_thresholds, Cli};
use ndwi_extract::utils::log::RunLog;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help/version requests are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Preflight failures abort before any log entry is written.
    let (params, mut log) = match preflight(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = BatchPipeline::new(params);
    let reports = pipeline.run(&[cli.pathfile.clone()], &mut log);

    for report in &reports {
        if let Some(first) = report.failures.first() {
            eprintln!("{}: {}", report.tile.display(), first);
        }
    }

    // Once processing has begun, per-tile failures are logged, not fatal.
    ExitCode::SUCCESS
}

fn preflight(cli: &Cli) -> Result<(BatchParams, RunLog)> {
    if !cli.pathfile.is_file() {
        bail!("Missing file '{}'", cli.pathfile.display());
    }
    if !cli.out_dir.is_dir() {
        bail!("Missing directory '{}'", cli.out_dir.display());
    }
    check_writable(&cli.out_dir)?;
    if cli.band1 < 1 || cli.band2 < 1 {
        bail!("Band numbers are 1-based");
    }
    if cli.min_pixels < 1 {
        bail!("min_pixels must be at least 1");
    }
    let thresholds = parse_thresholds(&cli.thresholds).map_err(|e| anyhow::anyhow!(e))?;

    let log = RunLog::open(&cli.out_dir.join("ndwi_run.log"))
        .with_context(|| format!("cannot open run log in '{}'", cli.out_dir.display()))?;

    let params = BatchParams {
        band1: cli.band1,
        band2: cli.band2,
        thresholds,
        min_pixels: cli.min_pixels,
        out_dir: cli.out_dir.clone(),
    };
    Ok((params, log))
}

fn check_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(".ndwi_extract_write_probe");
    std::fs::File::create(&probe)
        .with_context(|| format!("Not have permission for create in '{}'", dir.display()))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}
