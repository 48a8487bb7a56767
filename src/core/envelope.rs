use crate::types::{Envelope, RasterError, RasterResult};

/// Compute the minimal grid-aligned envelope covering every input.
///
/// Bounds are rounded outward onto the shared grid (floor for minima, ceil
/// for maxima) so the merged extent fully contains each input without
/// truncation. All inputs must agree on resolution and CRS; the first
/// envelope supplies the reference values.
pub fn merge_envelopes(envelopes: &[Envelope]) -> RasterResult<Envelope> {
    let first = envelopes.first().ok_or(RasterError::EmptyInput)?;
    let resolution = first.resolution;
    let crs = first.crs.clone();

    let mut min_x = first.min_x;
    let mut min_y = first.min_y;
    let mut max_x = first.max_x;
    let mut max_y = first.max_y;

    for envelope in &envelopes[1..] {
        if envelope.resolution != resolution {
            return Err(RasterError::ResolutionMismatch {
                expected: resolution,
                found: envelope.resolution,
            });
        }
        if envelope.crs != crs {
            return Err(RasterError::CrsMismatch(crs, envelope.crs.clone()));
        }
        min_x = min_x.min(envelope.min_x);
        min_y = min_y.min(envelope.min_y);
        max_x = max_x.max(envelope.max_x);
        max_y = max_y.max(envelope.max_y);
    }

    let merged = Envelope::new(
        (min_x / resolution).floor() * resolution,
        (min_y / resolution).floor() * resolution,
        (max_x / resolution).ceil() * resolution,
        (max_y / resolution).ceil() * resolution,
        resolution,
        crs,
    )?;

    log::debug!(
        "Merged {} envelopes into ({}, {}) - ({}, {})",
        envelopes.len(),
        merged.min_x,
        merged.min_y,
        merged.max_x,
        merged.max_y
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Crs;

    fn envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64, resolution: f64) -> Envelope {
        Envelope::new(min_x, min_y, max_x, max_y, resolution, Crs::epsg(27700)).unwrap()
    }

    #[test]
    fn test_merge_covers_all_inputs() {
        let a = envelope(0.0, 0.0, 200.0, 200.0, 100.0);
        let b = envelope(100.0, 100.0, 300.0, 300.0, 100.0);
        let merged = merge_envelopes(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(merged.min_x, 0.0);
        assert_eq!(merged.min_y, 0.0);
        assert_eq!(merged.max_x, 300.0);
        assert_eq!(merged.max_y, 300.0);
        assert!(merged.contains(&a));
        assert!(merged.contains(&b));
    }

    #[test]
    fn test_merge_handles_disjoint_extents() {
        let a = envelope(0.0, 0.0, 100.0, 100.0, 100.0);
        let b = envelope(500.0, 500.0, 600.0, 600.0, 100.0);
        let merged = merge_envelopes(&[a, b]).unwrap();

        assert_eq!(merged.min_x, 0.0);
        assert_eq!(merged.max_x, 600.0);
        assert_eq!(merged.cols(), 6);
        assert_eq!(merged.rows(), 6);
    }

    #[test]
    fn test_merge_snaps_unaligned_bounds_outward() {
        let a = envelope(30.0, -70.0, 260.0, 140.0, 100.0);
        let merged = merge_envelopes(&[a.clone()]).unwrap();

        assert_eq!(merged.min_x, 0.0);
        assert_eq!(merged.min_y, -100.0);
        assert_eq!(merged.max_x, 300.0);
        assert_eq!(merged.max_y, 200.0);
        assert!(merged.is_grid_aligned());
        assert!(merged.contains(&a));
    }

    #[test]
    fn test_merge_preserves_aligned_bounds() {
        let a = envelope(-200.0, 0.0, 400.0, 300.0, 100.0);
        let merged = merge_envelopes(&[a.clone()]).unwrap();
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_rejects_resolution_mismatch() {
        let a = envelope(0.0, 0.0, 100.0, 100.0, 50.0);
        let b = envelope(0.0, 0.0, 100.0, 100.0, 100.0);
        let err = merge_envelopes(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::ResolutionMismatch {
                expected,
                found,
            } if expected == 50.0 && found == 100.0
        ));
    }

    #[test]
    fn test_merge_rejects_crs_mismatch() {
        let a = envelope(0.0, 0.0, 100.0, 100.0, 100.0);
        let b = Envelope::new(0.0, 0.0, 100.0, 100.0, 100.0, Crs::epsg(4326)).unwrap();
        let err = merge_envelopes(&[a, b]).unwrap_err();
        assert!(matches!(err, RasterError::CrsMismatch(_, _)));
    }

    #[test]
    fn test_merge_rejects_empty_input() {
        let err = merge_envelopes(&[]).unwrap_err();
        assert!(matches!(err, RasterError::EmptyInput));
    }

    #[test]
    fn test_merged_bounds_are_grid_multiples() {
        let a = envelope(12.0, 7.0, 95.0, 88.0, 10.0);
        let b = envelope(-23.0, -41.0, 31.0, 19.0, 10.0);
        let merged = merge_envelopes(&[a, b]).unwrap();

        assert!(merged.is_grid_aligned());
        assert_eq!(merged.min_x, -30.0);
        assert_eq!(merged.min_y, -50.0);
        assert_eq!(merged.max_x, 100.0);
        assert_eq!(merged.max_y, 90.0);
    }
}
