use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Numeric type stored in every grid cell
pub type Sample = f64;

/// 2D grid of cell samples, indexed (row, col) with row 0 at the top
pub type SampleGrid = Array2<Sample>;

/// Opaque coordinate reference system token (e.g. "EPSG:27700").
///
/// The calculator only compares tokens for equality; it never looks up,
/// validates or transforms coordinate systems. Reprojection has to happen
/// upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(String);

impl Crs {
    /// Create a CRS token from any string identifier
    pub fn new<S: Into<String>>(token: S) -> Self {
        Crs(token.into())
    }

    /// Create a CRS token from an EPSG code
    pub fn epsg(code: u32) -> Self {
        Crs(format!("EPSG:{}", code))
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map algebra operation applied between the canvas and each coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// The identity element of the operation: combining a canvas cell with
    /// this value leaves the cell unchanged.
    ///
    /// Used both as the canvas fill value before any coverage is merged and
    /// as the replacement value for cells excluded by a radius mask.
    pub fn identity(self) -> Sample {
        match self {
            Operation::Add | Operation::Subtract => 0.0,
            Operation::Multiply | Operation::Divide => 1.0,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Subtract => write!(f, "subtract"),
            Operation::Multiply => write!(f, "multiply"),
            Operation::Divide => write!(f, "divide"),
        }
    }
}

impl FromStr for Operation {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            _ => Err(RasterError::UnsupportedOperation(s.to_string())),
        }
    }
}

/// Axis-aligned rectangular extent in world coordinates.
///
/// Carries the cell size and CRS token shared by every grid in a
/// calculation. Coordinates are expected to be exact multiples of
/// `resolution`; envelopes produced by merging always are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// Linear size of one grid cell, in world units
    pub resolution: f64,
    /// Opaque CRS token, compared for equality only
    pub crs: Crs,
}

impl Envelope {
    /// Create an envelope, validating ordering and a positive resolution
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        resolution: f64,
        crs: Crs,
    ) -> RasterResult<Self> {
        if !(resolution > 0.0) {
            return Err(RasterError::InvalidEnvelope(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }
        if max_x <= min_x || max_y <= min_y {
            return Err(RasterError::InvalidEnvelope(format!(
                "extent must be non-empty: ({}, {}) - ({}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        Ok(Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
            resolution,
            crs,
        })
    }

    /// Extent width in world units
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent height in world units
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Number of grid columns spanned by this envelope.
    ///
    /// For a grid-aligned envelope the width is an exact multiple of the
    /// resolution, so rounding the quotient recovers the integer count
    /// without the off-by-one a literal `ceil` can produce on floats.
    pub fn cols(&self) -> usize {
        (self.width() / self.resolution).round() as usize
    }

    /// Number of grid rows spanned by this envelope
    pub fn rows(&self) -> usize {
        (self.height() / self.resolution).round() as usize
    }

    /// Whether all four bounds sit on the grid defined by `resolution`
    pub fn is_grid_aligned(&self) -> bool {
        let on_grid = |v: f64| {
            let cells = v / self.resolution;
            (cells - cells.round()).abs() < 1e-9
        };
        on_grid(self.min_x) && on_grid(self.min_y) && on_grid(self.max_x) && on_grid(self.max_y)
    }

    /// Whether `other` lies entirely inside this envelope
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }
}

/// Error types for raster calculation
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("No input coverages supplied")]
    EmptyInput,

    #[error("Resolution mismatch: expected {expected}, found {found}")]
    ResolutionMismatch { expected: f64, found: f64 },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(Crs, Crs),

    #[error("Length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Unsupported operation: {0:?} (expected add, subtract, multiply or divide)")]
    UnsupportedOperation(String),

    #[error(
        "Placement of {cols}x{rows} cells at (col {col}, row {row}) \
         falls outside the {canvas_cols}x{canvas_rows} canvas"
    )]
    OutOfBounds {
        col: i64,
        row: i64,
        cols: usize,
        rows: usize,
        canvas_cols: usize,
        canvas_rows: usize,
    },

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Invalid grid dimensions: {cols}x{rows}")]
    InvalidDimensions { cols: usize, rows: usize },

    #[error("Invalid radius: {0} (must be positive)")]
    InvalidRadius(f64),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;
