use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use rastercalc::core::{process_coverages, Canvas, Coverage, MemoryCoverage};
use rastercalc::io::{read_asc, read_geotiff, write_asc, write_geotiff};
use rastercalc::types::{Crs, Operation};

mod cli;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Raster Map Algebra Calculator ===");

    if let Some(n_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()
            .context("Failed to build thread pool")?;
        info!("Using {} threads for decoding", n_threads);
    }

    let operation: Operation = args.operation.parse()?;
    let crs = Crs::new(&args.crs);

    let paths = if args.inputs.is_empty() {
        match &args.input_dir {
            Some(dir) => {
                let paths = scan_input_dir(dir)?;
                info!("Found {} rasters in {}", paths.len(), dir.display());
                paths
            }
            None => bail!("No input rasters given"),
        }
    } else {
        args.inputs.clone()
    };

    // Decoding is independent per file; the merge order stays the input
    // path order regardless of which decode finishes first
    let decoded: Vec<MemoryCoverage> = paths
        .par_iter()
        .map(|path| {
            load_coverage(path, &crs)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<_>>()?;

    let coverages: Vec<Box<dyn Coverage>> = decoded
        .into_iter()
        .map(|coverage| Box::new(coverage) as Box<dyn Coverage>)
        .collect();

    let canvas = process_coverages(coverages, operation, args.radius)?;

    info!("Writing result to {}", args.output.display());
    write_canvas(&canvas, &args.output)?;

    info!("=== Done! ===");
    Ok(())
}

/// Collect supported raster paths from the input directory, sorted by name
/// so the merge order is stable across platforms
fn scan_input_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read input directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                extension_of(path).as_deref(),
                Some("asc") | Some("tif") | Some("tiff")
            )
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!(
            "No .asc or .tif rasters found in {}",
            dir.display()
        );
    }
    Ok(paths)
}

/// Decode one raster file into a coverage, picking the reader by extension
fn load_coverage(path: &Path, crs: &Crs) -> Result<MemoryCoverage> {
    let coverage = match extension_of(path).as_deref() {
        Some("asc") => read_asc(path, crs)?,
        Some("tif") | Some("tiff") => read_geotiff(path, crs)?,
        _ => bail!("Unsupported input format: {}", path.display()),
    };
    Ok(coverage)
}

/// Write the finished canvas, picking the writer by extension
fn write_canvas(canvas: &Canvas, path: &Path) -> Result<()> {
    match extension_of(path).as_deref() {
        Some("asc") => write_asc(canvas, path)?,
        Some("tif") | Some("tiff") => write_geotiff(canvas, path)?,
        _ => bail!("Unsupported output format: {}", path.display()),
    }
    Ok(())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
