use crate::types::{RasterError, RasterResult, Sample};

/// Limit a patch's contribution to cells near its own center.
///
/// `radius` is in world units and is compared against Euclidean distance in
/// cell units, so a cell at offset `(dx, dy)` from the center index passes
/// when `sqrt(dx^2 + dy^2) < radius / resolution`. Cells failing the test
/// have their value replaced by `replacement`, which callers set to the
/// operation's identity so excluded cells leave the canvas untouched.
///
/// The center index is the midpoint of the flattened buffer: column
/// `(len / 2) % cols`, row `(len / 2) / cols`. For odd dimensions this is
/// the exact middle cell; for even dimensions it sits just past it.
pub fn enforce_radius(
    values: &[Sample],
    cols: usize,
    rows: usize,
    radius: f64,
    resolution: f64,
    replacement: Sample,
) -> RasterResult<Vec<Sample>> {
    if !(radius > 0.0) {
        return Err(RasterError::InvalidRadius(radius));
    }
    if cols == 0 || rows == 0 {
        return Err(RasterError::InvalidDimensions { cols, rows });
    }
    if values.len() != cols * rows {
        return Err(RasterError::LengthMismatch {
            expected: cols * rows,
            found: values.len(),
        });
    }

    let center_col = (values.len() / 2) % cols;
    let center_row = (values.len() / 2) / cols;
    let cutoff = radius / resolution;

    let mut out = Vec::with_capacity(values.len());
    let mut kept = 0usize;
    for row in 0..rows {
        for col in 0..cols {
            let dx = col as f64 - center_col as f64;
            let dy = row as f64 - center_row as f64;
            if (dx * dx + dy * dy).sqrt() < cutoff {
                out.push(values[row * cols + col]);
                kept += 1;
            } else {
                out.push(replacement);
            }
        }
    }

    log::debug!(
        "Radius mask kept {} of {} cells (cutoff {:.2} cells around ({}, {}))",
        kept,
        values.len(),
        cutoff,
        center_col,
        center_row
    );

    Ok(out)
}
