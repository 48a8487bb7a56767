use crate::core::canvas::Canvas;
use crate::core::coverage::MemoryCoverage;
use crate::types::{Crs, Envelope, RasterError, RasterResult, Sample};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// NODATA marker written by `write_asc`
const NODATA_VALUE: f64 = -9999.0;

/// Read an Esri ASCII grid (.asc) into a coverage.
///
/// The format carries no coordinate system information, so the caller
/// supplies the CRS token to stamp on the envelope. Both `xllcorner` and
/// `xllcenter` anchor conventions are accepted; cells equal to the file's
/// NODATA value are loaded as NaN.
pub fn read_asc<P: AsRef<Path>>(path: P, crs: &Crs) -> RasterResult<MemoryCoverage> {
    log::debug!("Reading ASC grid from {}", path.as_ref().display());
    let file = File::open(path.as_ref())?;
    parse_asc(BufReader::new(file), crs)
}

/// Write a finished canvas as an Esri ASCII grid.
///
/// Rows are written north to south, matching the canvas layout; NaN cells
/// are written as the NODATA value.
pub fn write_asc<P: AsRef<Path>>(canvas: &Canvas, path: P) -> RasterResult<()> {
    log::debug!("Writing ASC grid to {}", path.as_ref().display());
    let file = File::create(path.as_ref())?;
    encode_asc(canvas, BufWriter::new(file))
}

/// Parse an ASC grid from any buffered source
fn parse_asc<R: BufRead>(reader: R, crs: &Crs) -> RasterResult<MemoryCoverage> {
    let mut ncols: Option<usize> = None;
    let mut nrows: Option<usize> = None;
    let mut xll: Option<(f64, bool)> = None;
    let mut yll: Option<(f64, bool)> = None;
    let mut cellsize: Option<f64> = None;
    let mut nodata: Option<f64> = None;
    let mut samples: Vec<Sample> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let starts_header = trimmed
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false);

        if starts_header {
            let mut parts = trimmed.split_whitespace();
            let key = parts
                .next()
                .ok_or_else(|| RasterError::InvalidFormat("empty header line".to_string()))?
                .to_ascii_lowercase();
            let value = parts.next().ok_or_else(|| {
                RasterError::InvalidFormat(format!("header '{}' has no value", key))
            })?;

            match key.as_str() {
                "ncols" => ncols = Some(parse_count(&key, value)?),
                "nrows" => nrows = Some(parse_count(&key, value)?),
                "xllcorner" => xll = Some((parse_number(&key, value)?, false)),
                "xllcenter" => xll = Some((parse_number(&key, value)?, true)),
                "yllcorner" => yll = Some((parse_number(&key, value)?, false)),
                "yllcenter" => yll = Some((parse_number(&key, value)?, true)),
                "cellsize" => cellsize = Some(parse_number(&key, value)?),
                "nodata_value" => nodata = Some(parse_number(&key, value)?),
                _ => {
                    return Err(RasterError::InvalidFormat(format!(
                        "unknown header '{}'",
                        key
                    )))
                }
            }
        } else {
            for token in trimmed.split_whitespace() {
                let value = parse_number("sample", token)?;
                match nodata {
                    Some(nodata) if value == nodata => samples.push(f64::NAN),
                    _ => samples.push(value),
                }
            }
        }
    }

    let ncols = ncols.ok_or_else(|| missing_header("ncols"))?;
    let nrows = nrows.ok_or_else(|| missing_header("nrows"))?;
    let (xll, x_is_center) = xll.ok_or_else(|| missing_header("xllcorner"))?;
    let (yll, y_is_center) = yll.ok_or_else(|| missing_header("yllcorner"))?;
    let cellsize = cellsize.ok_or_else(|| missing_header("cellsize"))?;

    if samples.len() != ncols * nrows {
        return Err(RasterError::LengthMismatch {
            expected: ncols * nrows,
            found: samples.len(),
        });
    }

    let min_x = if x_is_center { xll - cellsize / 2.0 } else { xll };
    let min_y = if y_is_center { yll - cellsize / 2.0 } else { yll };
    let envelope = Envelope::new(
        min_x,
        min_y,
        min_x + ncols as f64 * cellsize,
        min_y + nrows as f64 * cellsize,
        cellsize,
        crs.clone(),
    )?;

    MemoryCoverage::new(envelope, ncols, nrows, samples)
}

/// Encode a canvas as ASC into any sink
fn encode_asc<W: Write>(canvas: &Canvas, mut writer: W) -> RasterResult<()> {
    let envelope = canvas.envelope();
    writeln!(writer, "ncols {}", canvas.cols())?;
    writeln!(writer, "nrows {}", canvas.rows())?;
    writeln!(writer, "xllcorner {}", envelope.min_x)?;
    writeln!(writer, "yllcorner {}", envelope.min_y)?;
    writeln!(writer, "cellsize {}", envelope.resolution)?;
    writeln!(writer, "NODATA_value {}", NODATA_VALUE)?;

    for row in 0..canvas.rows() {
        let mut line = String::with_capacity(canvas.cols() * 8);
        for col in 0..canvas.cols() {
            if col > 0 {
                line.push(' ');
            }
            let value = canvas.get(row, col);
            if value.is_nan() {
                line.push_str(&NODATA_VALUE.to_string());
            } else {
                line.push_str(&value.to_string());
            }
        }
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

fn parse_count(key: &str, value: &str) -> RasterResult<usize> {
    value
        .parse::<usize>()
        .map_err(|_| RasterError::InvalidFormat(format!("invalid {} value '{}'", key, value)))
}

fn parse_number(key: &str, value: &str) -> RasterResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| RasterError::InvalidFormat(format!("invalid {} value '{}'", key, value)))
}

fn missing_header(key: &str) -> RasterError {
    RasterError::InvalidFormat(format!("missing header '{}'", key))
}
