use crate::types::{Envelope, RasterError, RasterResult, Sample, SampleGrid};
use ndarray::Array2;

/// The single mutable output grid accumulating merged results.
///
/// Owned by the orchestrator for the duration of one calculation and handed
/// to the caller once the fold completes. Row 0 maps to the top of the
/// envelope (`max_y`), matching the usual raster layout.
#[derive(Debug, Clone)]
pub struct Canvas {
    envelope: Envelope,
    grid: SampleGrid,
}

impl Canvas {
    /// Allocate a canvas covering `envelope` with every cell set to `value`.
    ///
    /// The grid is sized from the envelope's cell counts; an extent smaller
    /// than one cell in either direction is rejected.
    pub fn filled(envelope: Envelope, value: Sample) -> RasterResult<Self> {
        let cols = envelope.cols();
        let rows = envelope.rows();
        if cols == 0 || rows == 0 {
            return Err(RasterError::InvalidDimensions { cols, rows });
        }

        log::debug!(
            "Allocating {}x{} canvas at resolution {} filled with {}",
            cols,
            rows,
            envelope.resolution,
            value
        );

        Ok(Self {
            grid: Array2::from_elem((rows, cols), value),
            envelope,
        })
    }

    /// The canvas extent
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Cell size in world units
    pub fn resolution(&self) -> f64 {
        self.envelope.resolution
    }

    /// Number of grid columns
    pub fn cols(&self) -> usize {
        self.grid.ncols()
    }

    /// Number of grid rows
    pub fn rows(&self) -> usize {
        self.grid.nrows()
    }

    /// Sample value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Sample {
        self.grid[[row, col]]
    }

    /// Overwrite the sample at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: Sample) {
        self.grid[[row, col]] = value;
    }

    /// Borrow the backing grid
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// Consume the canvas, yielding its envelope and backing grid
    pub fn into_parts(self) -> (Envelope, SampleGrid) {
        (self.envelope, self.grid)
    }

    /// Transform a world coordinate to a (col, row) cell index.
    ///
    /// This is the pure affine mapping derived from the canvas envelope:
    /// `col = round((x - min_x) / resolution)` and
    /// `row = round((max_y - y) / resolution)`. Coordinates outside the
    /// envelope produce indices outside the grid, which the rectangle
    /// accessors reject; no offset correction is ever applied.
    pub fn world_to_grid(&self, x: f64, y: f64) -> (i64, i64) {
        let resolution = self.envelope.resolution;
        let col = ((x - self.envelope.min_x) / resolution).round() as i64;
        let row = ((self.envelope.max_y - y) / resolution).round() as i64;
        (col, row)
    }

    /// Read the rectangle of `ncols * nrows` cells anchored at (col, row),
    /// flattened row-major
    pub fn read_rect(
        &self,
        col: i64,
        row: i64,
        ncols: usize,
        nrows: usize,
    ) -> RasterResult<Vec<Sample>> {
        let (col, row) = self.check_rect(col, row, ncols, nrows)?;

        let mut out = Vec::with_capacity(ncols * nrows);
        for r in row..row + nrows {
            for c in col..col + ncols {
                out.push(self.grid[[r, c]]);
            }
        }
        Ok(out)
    }

    /// Write `values` (row-major, length `ncols * nrows`) into the rectangle
    /// anchored at (col, row), leaving every cell outside it untouched
    pub fn write_rect(
        &mut self,
        col: i64,
        row: i64,
        ncols: usize,
        nrows: usize,
        values: &[Sample],
    ) -> RasterResult<()> {
        if values.len() != ncols * nrows {
            return Err(RasterError::LengthMismatch {
                expected: ncols * nrows,
                found: values.len(),
            });
        }
        let (col, row) = self.check_rect(col, row, ncols, nrows)?;

        for r in 0..nrows {
            for c in 0..ncols {
                self.grid[[row + r, col + c]] = values[r * ncols + c];
            }
        }
        Ok(())
    }

    /// Reject rectangles that fall outside the grid; never truncate or wrap
    fn check_rect(
        &self,
        col: i64,
        row: i64,
        ncols: usize,
        nrows: usize,
    ) -> RasterResult<(usize, usize)> {
        let out_of_bounds = col < 0
            || row < 0
            || col as usize + ncols > self.cols()
            || row as usize + nrows > self.rows();
        if out_of_bounds {
            return Err(RasterError::OutOfBounds {
                col,
                row,
                cols: ncols,
                rows: nrows,
                canvas_cols: self.cols(),
                canvas_rows: self.rows(),
            });
        }
        Ok((col as usize, row as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Crs;

    fn envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64, resolution: f64) -> Envelope {
        Envelope::new(min_x, min_y, max_x, max_y, resolution, Crs::epsg(27700)).unwrap()
    }

    #[test]
    fn test_filled_canvas_has_uniform_value() {
        let canvas = Canvas::filled(envelope(0.0, 0.0, 300.0, 200.0, 100.0), 1.0).unwrap();
        assert_eq!(canvas.cols(), 3);
        assert_eq!(canvas.rows(), 2);
        assert!(canvas.grid().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_filled_rejects_sub_cell_extent() {
        let tiny = envelope(0.0, 0.0, 30.0, 100.0, 100.0);
        let err = Canvas::filled(tiny, 0.0).unwrap_err();
        assert!(matches!(err, RasterError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_world_to_grid_maps_corners() {
        let canvas = Canvas::filled(envelope(100.0, 200.0, 400.0, 500.0, 100.0), 0.0).unwrap();

        // Top-left world corner is cell (0, 0)
        assert_eq!(canvas.world_to_grid(100.0, 500.0), (0, 0));
        // Bottom-right world corner is one past the last cell
        assert_eq!(canvas.world_to_grid(400.0, 200.0), (3, 3));
        // One cell in from the top-left
        assert_eq!(canvas.world_to_grid(200.0, 400.0), (1, 1));
    }

    #[test]
    fn test_world_to_grid_goes_negative_outside_envelope() {
        let canvas = Canvas::filled(envelope(100.0, 100.0, 300.0, 300.0, 100.0), 0.0).unwrap();
        assert_eq!(canvas.world_to_grid(0.0, 400.0), (-1, -1));
    }

    #[test]
    fn test_rect_round_trip() {
        let mut canvas = Canvas::filled(envelope(0.0, 0.0, 400.0, 400.0, 100.0), 0.0).unwrap();
        canvas
            .write_rect(1, 1, 2, 2, &[1.0, 2.0, 3.0, 4.0])
            .unwrap();

        assert_eq!(canvas.read_rect(1, 1, 2, 2).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(canvas.get(1, 1), 1.0);
        assert_eq!(canvas.get(1, 2), 2.0);
        assert_eq!(canvas.get(2, 1), 3.0);
        assert_eq!(canvas.get(2, 2), 4.0);
        // Cells outside the rectangle stay at the fill value
        assert_eq!(canvas.get(0, 0), 0.0);
        assert_eq!(canvas.get(3, 3), 0.0);
    }

    #[test]
    fn test_rect_rejects_negative_anchor() {
        let canvas = Canvas::filled(envelope(0.0, 0.0, 200.0, 200.0, 100.0), 0.0).unwrap();
        let err = canvas.read_rect(-1, 0, 1, 1).unwrap_err();
        assert!(matches!(err, RasterError::OutOfBounds { col: -1, .. }));
    }

    #[test]
    fn test_rect_rejects_overflow_past_edge() {
        let mut canvas = Canvas::filled(envelope(0.0, 0.0, 200.0, 200.0, 100.0), 0.0).unwrap();
        let err = canvas.write_rect(1, 1, 2, 2, &[0.0; 4]).unwrap_err();
        assert!(matches!(err, RasterError::OutOfBounds { .. }));
    }

    #[test]
    fn test_write_rect_rejects_wrong_value_count() {
        let mut canvas = Canvas::filled(envelope(0.0, 0.0, 200.0, 200.0, 100.0), 0.0).unwrap();
        let err = canvas.write_rect(0, 0, 2, 2, &[0.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::LengthMismatch {
                expected: 4,
                found: 3
            }
        ));
    }
}
