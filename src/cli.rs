use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rastercalc")]
#[command(about = "Merge rasters of differing extents with map algebra")]
#[command(version)]
pub struct Args {
    /// Explicit input rasters, merged in the order given
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Directory scanned for input rasters (.asc, .tif, .tiff), merged in
    /// sorted name order
    #[arg(
        short,
        long,
        value_name = "DIR",
        conflicts_with = "inputs",
        required_unless_present = "inputs"
    )]
    pub input_dir: Option<PathBuf>,

    /// Output raster path; the extension picks the format
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Operation applied between the accumulating canvas and each input
    /// (add, subtract, multiply, divide)
    #[arg(long, value_name = "OP", default_value = "add")]
    pub operation: String,

    /// Limit every input's contribution to this distance around its own
    /// center, in world units
    #[arg(short, long, value_name = "DISTANCE")]
    pub radius: Option<f64>,

    /// CRS token stamped on inputs, compared for equality only
    #[arg(long, value_name = "CRS", default_value = "EPSG:27700")]
    pub crs: String,

    /// Number of threads for parallel decoding (default: all available)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
