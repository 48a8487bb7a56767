use crate::types::{Envelope, RasterError, RasterResult, Sample, SampleGrid};
use ndarray::Array2;

/// Read-only handle to one input grid.
///
/// Implementations are supplied by the decoding layer (file readers, tests,
/// callers with in-memory data). The merge engine takes each coverage by
/// value and drops it once its contribution is written, so any resource the
/// implementation holds is released on every exit path of that one step.
pub trait Coverage {
    /// Spatial extent of this grid, carrying resolution and CRS token
    fn envelope(&self) -> &Envelope;

    /// Number of grid columns
    fn cols(&self) -> usize;

    /// Number of grid rows
    fn rows(&self) -> usize;

    /// Sample value at (row, col), row 0 at the top
    fn sample(&self, row: usize, col: usize) -> Sample;

    /// All samples flattened row-major.
    ///
    /// The default walks `sample`; implementations backed by a flat buffer
    /// should override with a direct copy.
    fn samples(&self) -> Vec<Sample> {
        let mut out = Vec::with_capacity(self.rows() * self.cols());
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                out.push(self.sample(row, col));
            }
        }
        out
    }
}

/// Coverage backed by an in-memory grid
#[derive(Debug, Clone)]
pub struct MemoryCoverage {
    envelope: Envelope,
    grid: SampleGrid,
}

impl MemoryCoverage {
    /// Create a coverage from a flat row-major buffer.
    ///
    /// The buffer length must equal `cols * rows`, and the dimensions must
    /// agree with the cell counts implied by the envelope and its
    /// resolution.
    pub fn new(
        envelope: Envelope,
        cols: usize,
        rows: usize,
        samples: Vec<Sample>,
    ) -> RasterResult<Self> {
        if samples.len() != cols * rows {
            return Err(RasterError::LengthMismatch {
                expected: cols * rows,
                found: samples.len(),
            });
        }
        let grid = Array2::from_shape_vec((rows, cols), samples)
            .map_err(|_| RasterError::InvalidDimensions { cols, rows })?;
        Self::from_grid(envelope, grid)
    }

    /// Create a coverage from a 2D array, taking dimensions from its shape
    pub fn from_grid(envelope: Envelope, grid: SampleGrid) -> RasterResult<Self> {
        let (rows, cols) = grid.dim();
        if cols == 0 || rows == 0 {
            return Err(RasterError::InvalidDimensions { cols, rows });
        }
        if cols != envelope.cols() || rows != envelope.rows() {
            return Err(RasterError::InvalidEnvelope(format!(
                "envelope spans {}x{} cells but the grid is {}x{}",
                envelope.cols(),
                envelope.rows(),
                cols,
                rows
            )));
        }
        Ok(Self { envelope, grid })
    }
}

impl Coverage for MemoryCoverage {
    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn cols(&self) -> usize {
        self.grid.ncols()
    }

    fn rows(&self) -> usize {
        self.grid.nrows()
    }

    fn sample(&self, row: usize, col: usize) -> Sample {
        self.grid[[row, col]]
    }

    fn samples(&self) -> Vec<Sample> {
        self.grid.iter().copied().collect()
    }
}
