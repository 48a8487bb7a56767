//! I/O modules for reading coverages and writing the finished canvas

pub mod asc;
pub mod geotiff;

pub use asc::{read_asc, write_asc};
pub use geotiff::{read_geotiff, write_geotiff};
