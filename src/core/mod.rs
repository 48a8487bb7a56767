//! Core map algebra modules

pub mod envelope;
pub mod coverage;
pub mod canvas;
pub mod algebra;
pub mod mask;
pub mod merge;
pub mod calculator;

// Re-export main types
pub use envelope::merge_envelopes;
pub use coverage::{Coverage, MemoryCoverage};
pub use canvas::Canvas;
pub use algebra::combine;
pub use mask::enforce_radius;
pub use merge::apply_coverage;
pub use calculator::{RasterCalculator, process_coverages};
