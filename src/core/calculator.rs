use crate::core::canvas::Canvas;
use crate::core::coverage::Coverage;
use crate::core::envelope::merge_envelopes;
use crate::core::merge::apply_coverage;
use crate::types::{Operation, RasterError, RasterResult};

/// Map algebra calculator merging ordered coverages into one canvas.
///
/// The calculation is a strict left fold: the first coverage seeds the
/// canvas with its values, and the chosen operation is applied between the
/// accumulating canvas and each later coverage in input order. Order is
/// preserved exactly as given, since Subtract and Divide are sensitive to
/// it. Any error aborts the whole calculation; no partial canvas escapes.
pub struct RasterCalculator {
    /// Operation applied between the canvas and each coverage
    operation: Operation,
    /// Optional per-coverage radii, same length as the input sequence
    radii: Option<Vec<f64>>,
}

impl RasterCalculator {
    /// Create a calculator for the given operation, with no radius limits
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            radii: None,
        }
    }

    /// Limit each coverage's contribution to a circle around its own
    /// center, one radius per coverage in input order
    pub fn with_radii(mut self, radii: Vec<f64>) -> Self {
        self.radii = Some(radii);
        self
    }

    /// The configured operation
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Merge the coverages, consuming them, and return the finished canvas.
    ///
    /// The canvas extent is the grid-aligned union of every coverage
    /// envelope; cells no coverage touches keep the operation's identity
    /// value. All validation (non-empty input, matching resolutions and
    /// CRS, radii list length) happens before the canvas is allocated.
    pub fn process(&self, coverages: Vec<Box<dyn Coverage>>) -> RasterResult<Canvas> {
        if coverages.is_empty() {
            return Err(RasterError::EmptyInput);
        }
        if let Some(radii) = &self.radii {
            if radii.len() != coverages.len() {
                return Err(RasterError::LengthMismatch {
                    expected: coverages.len(),
                    found: radii.len(),
                });
            }
            for radius in radii {
                if !(*radius > 0.0) {
                    return Err(RasterError::InvalidRadius(*radius));
                }
            }
        }

        log::info!(
            "🧮 Merging {} coverages with operation '{}'",
            coverages.len(),
            self.operation
        );

        let envelopes: Vec<_> = coverages
            .iter()
            .map(|coverage| coverage.envelope().clone())
            .collect();
        let merged = merge_envelopes(&envelopes)?;

        log::debug!(
            "Combined envelope ({}, {}) - ({}, {}) at resolution {}",
            merged.min_x,
            merged.min_y,
            merged.max_x,
            merged.max_y,
            merged.resolution
        );

        let mut canvas = Canvas::filled(merged, self.operation.identity())?;

        for (index, coverage) in coverages.into_iter().enumerate() {
            let radius = self.radii.as_ref().map(|radii| radii[index]);
            apply_coverage(&mut canvas, coverage, self.operation, radius, index == 0)?;
        }

        log::info!(
            "✅ Calculation complete: {}x{} canvas",
            canvas.cols(),
            canvas.rows()
        );

        Ok(canvas)
    }
}

/// Convenience function running one calculation, broadcasting one optional
/// radius to every coverage
pub fn process_coverages(
    coverages: Vec<Box<dyn Coverage>>,
    operation: Operation,
    radius: Option<f64>,
) -> RasterResult<Canvas> {
    let calculator = match radius {
        Some(radius) => {
            RasterCalculator::new(operation).with_radii(vec![radius; coverages.len()])
        }
        None => RasterCalculator::new(operation),
    };
    calculator.process(coverages)
}
