use crate::core::algebra::combine;
use crate::core::canvas::Canvas;
use crate::core::coverage::Coverage;
use crate::core::mask::enforce_radius;
use crate::types::{Operation, RasterError, RasterResult};

/// Merge one coverage's contribution into the canvas.
///
/// The coverage is taken by value and dropped when this step returns, on
/// success and on error alike, so a source holding file handles or decoder
/// state is released exactly once per coverage regardless of how the
/// surrounding fold ends.
///
/// The placement of the coverage inside the canvas is derived purely from
/// the canvas affine mapping applied to the coverage's top-left world
/// corner. When `seed` is true the (optionally masked) patch is written
/// directly, establishing base values; otherwise the patch is combined with
/// the canvas cells it lands on and the result written back. Cells outside
/// the destination rectangle are never touched.
pub fn apply_coverage(
    canvas: &mut Canvas,
    coverage: Box<dyn Coverage>,
    operation: Operation,
    radius: Option<f64>,
    seed: bool,
) -> RasterResult<()> {
    let envelope = coverage.envelope();

    if envelope.resolution != canvas.resolution() {
        return Err(RasterError::ResolutionMismatch {
            expected: canvas.resolution(),
            found: envelope.resolution,
        });
    }
    if envelope.crs != canvas.envelope().crs {
        return Err(RasterError::CrsMismatch(
            canvas.envelope().crs.clone(),
            envelope.crs.clone(),
        ));
    }

    let cols = coverage.cols();
    let rows = coverage.rows();
    let (col, row) = canvas.world_to_grid(envelope.min_x, envelope.max_y);

    log::debug!(
        "Placing {}x{} coverage at canvas cell (col {}, row {})",
        cols,
        rows,
        col,
        row
    );

    let mut values = coverage.samples();
    if values.len() != cols * rows {
        return Err(RasterError::LengthMismatch {
            expected: cols * rows,
            found: values.len(),
        });
    }

    if let Some(radius) = radius {
        values = enforce_radius(
            &values,
            cols,
            rows,
            radius,
            canvas.resolution(),
            operation.identity(),
        )?;
    }

    if seed {
        canvas.write_rect(col, row, cols, rows, &values)?;
    } else {
        let current = canvas.read_rect(col, row, cols, rows)?;
        let combined = combine(operation, &current, &values)?;
        canvas.write_rect(col, row, cols, rows, &combined)?;
    }

    Ok(())
}
