//! rastercalc: A Fast Map Algebra Calculator for Merging Rasters
//!
//! This library merges an ordered collection of spatial grids covering
//! different, possibly overlapping extents into one combined grid, applying
//! a pixel-wise operation (add, subtract, multiply, divide) between the
//! accumulating canvas and each input without ever clipping an input to the
//! overlap region of the others.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Crs, Envelope, Operation, RasterError, RasterResult, Sample, SampleGrid,
};

pub use core::{
    process_coverages, Canvas, Coverage, MemoryCoverage, RasterCalculator,
};

pub use io::{read_asc, read_geotiff, write_asc, write_geotiff};
