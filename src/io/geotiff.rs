use crate::core::canvas::Canvas;
use crate::core::coverage::MemoryCoverage;
use crate::types::{Crs, Envelope, RasterError, RasterResult, Sample};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoTIFF tag ids
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

/// Read a single-band GeoTIFF into a coverage.
///
/// The envelope is reconstructed from the ModelPixelScale and ModelTiepoint
/// tags; a TIFF without them cannot be placed in the world and is rejected.
/// Cells must be square, since the calculator carries one resolution. The
/// caller supplies the CRS token; embedded projection keys are not parsed.
pub fn read_geotiff<P: AsRef<Path>>(path: P, crs: &Crs) -> RasterResult<MemoryCoverage> {
    log::debug!("Reading GeoTIFF from {}", path.as_ref().display());
    let file = File::open(path.as_ref())?;
    decode_geotiff(file, crs)
}

/// Write a finished canvas as a 32-bit float GeoTIFF.
///
/// Writes ModelPixelScale, ModelTiepoint and a minimal GeoKey directory so
/// GIS tools recognize the georeferencing; when the CRS token is an EPSG
/// code it is embedded as the projected CS key.
pub fn write_geotiff<P: AsRef<Path>>(canvas: &Canvas, path: P) -> RasterResult<()> {
    log::debug!("Writing GeoTIFF to {}", path.as_ref().display());
    let file = File::create(path.as_ref())?;
    encode_geotiff(canvas, file)
}

/// Decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<R>(reader: R, crs: &Crs) -> RasterResult<MemoryCoverage>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let cols = width as usize;
    let rows = height as usize;

    let samples: Vec<Sample> = match decoder.read_image()? {
        DecodingResult::F64(buffer) => buffer,
        DecodingResult::F32(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::U8(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buffer) => buffer.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buffer) => buffer.into_iter().map(f64::from).collect(),
        _ => {
            return Err(RasterError::InvalidFormat(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    if samples.len() != cols * rows {
        return Err(RasterError::LengthMismatch {
            expected: cols * rows,
            found: samples.len(),
        });
    }

    let envelope = read_envelope(&mut decoder, cols, rows, crs)?;
    MemoryCoverage::new(envelope, cols, rows, samples)
}

/// Reconstruct the envelope from the georeferencing tags
fn read_envelope<R>(
    decoder: &mut Decoder<R>,
    cols: usize,
    rows: usize,
    crs: &Crs,
) -> RasterResult<Envelope>
where
    R: std::io::Read + std::io::Seek,
{
    // The decoder keys its directory by `Tag::from_u16_exhaustive`, which
    // yields the known variants for these ids, so `Tag::Unknown` never matches
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
        .map_err(|_| {
            RasterError::InvalidFormat(
                "missing ModelPixelScale tag (not a GeoTIFF?)".to_string(),
            )
        })?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
        .map_err(|_| {
            RasterError::InvalidFormat("missing ModelTiepoint tag (not a GeoTIFF?)".to_string())
        })?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RasterError::InvalidFormat(
            "malformed georeferencing tags".to_string(),
        ));
    }

    let (scale_x, scale_y) = (scale[0], scale[1]);
    if scale_x != scale_y {
        return Err(RasterError::InvalidFormat(format!(
            "non-square cells ({} x {}) are not supported",
            scale_x, scale_y
        )));
    }

    // tiepoint is [I, J, K, X, Y, Z]: raster point (I, J) sits at world (X, Y)
    let origin_x = tiepoint[3] - tiepoint[0] * scale_x;
    let origin_y = tiepoint[4] + tiepoint[1] * scale_y;

    Envelope::new(
        origin_x,
        origin_y - rows as f64 * scale_y,
        origin_x + cols as f64 * scale_x,
        origin_y,
        scale_x,
        crs.clone(),
    )
}

/// Encode a canvas as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<W>(canvas: &Canvas, writer: W) -> RasterResult<()>
where
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let envelope = canvas.envelope();
    let resolution = envelope.resolution;

    let data: Vec<f32> = canvas.grid().iter().map(|v| *v as f32).collect();

    let mut image = encoder.new_image::<Gray32Float>(canvas.cols() as u32, canvas.rows() as u32)?;

    let scale = [resolution, resolution, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), &scale[..])?;

    // Anchor raster cell (0, 0) at the top-left world corner
    let tiepoint = [0.0, 0.0, 0.0, envelope.min_x, envelope.max_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_MODEL_TIEPOINT), &tiepoint[..])?;

    image
        .encoder()
        .write_tag(Tag::Unknown(TAG_GEO_KEY_DIRECTORY), geo_keys(&envelope.crs).as_slice())?;

    image.write_data(&data)?;
    Ok(())
}

/// Minimal GeoKey directory: projected model, pixel-is-area, and the EPSG
/// code when the CRS token carries one that fits in a short
fn geo_keys(crs: &Crs) -> Vec<u16> {
    let epsg = crs
        .as_str()
        .strip_prefix("EPSG:")
        .and_then(|code| code.parse::<u16>().ok());

    match epsg {
        Some(code) => vec![
            1, 1, 0, 3, // version 1.1.0, 3 keys
            1024, 0, 1, 1, // GTModelTypeGeoKey = projected
            1025, 0, 1, 1, // GTRasterTypeGeoKey = pixel is area
            3072, 0, 1, code, // ProjectedCSTypeGeoKey
        ],
        None => vec![
            1, 1, 0, 2, // version 1.1.0, 2 keys
            1024, 0, 1, 1, // GTModelTypeGeoKey = projected
            1025, 0, 1, 1, // GTRasterTypeGeoKey = pixel is area
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coverage::Coverage;
    use std::io::Cursor;

    fn small_canvas() -> Canvas {
        let envelope =
            Envelope::new(100.0, 200.0, 400.0, 400.0, 100.0, Crs::epsg(27700)).unwrap();
        let mut canvas = Canvas::filled(envelope, 0.0).unwrap();
        canvas
            .write_rect(0, 0, 3, 2, &[1.0, 2.5, 3.0, 4.0, 5.5, 6.0])
            .unwrap();
        canvas
    }

    #[test]
    fn test_round_trip_preserves_samples_and_envelope() {
        let canvas = small_canvas();
        let mut buffer = Cursor::new(Vec::new());
        encode_geotiff(&canvas, &mut buffer).unwrap();

        buffer.set_position(0);
        let coverage = decode_geotiff(buffer, &Crs::epsg(27700)).unwrap();

        assert_eq!(coverage.cols(), 3);
        assert_eq!(coverage.rows(), 2);
        assert_eq!(coverage.samples(), vec![1.0, 2.5, 3.0, 4.0, 5.5, 6.0]);
        assert_eq!(coverage.envelope(), canvas.envelope());
    }

    #[test]
    fn test_plain_tiff_without_geo_tags_rejected() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            encoder
                .write_image::<Gray32Float>(2, 2, &[1.0, 2.0, 3.0, 4.0])
                .unwrap();
        }

        buffer.set_position(0);
        let err = decode_geotiff(buffer, &Crs::epsg(27700)).unwrap_err();
        assert!(matches!(err, RasterError::InvalidFormat(message)
            if message.contains("ModelPixelScale")));
    }

    #[test]
    fn test_non_square_cells_rejected() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            let mut image = encoder.new_image::<Gray32Float>(2, 2).unwrap();
            image
                .encoder()
                .write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), &[100.0, 50.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(
                    Tag::Unknown(TAG_MODEL_TIEPOINT),
                    &[0.0, 0.0, 0.0, 0.0, 200.0, 0.0][..],
                )
                .unwrap();
            image.write_data(&[1.0_f32, 2.0, 3.0, 4.0]).unwrap();
        }

        buffer.set_position(0);
        let err = decode_geotiff(buffer, &Crs::epsg(27700)).unwrap_err();
        assert!(matches!(err, RasterError::InvalidFormat(message)
            if message.contains("non-square")));
    }

    #[test]
    fn test_tiepoint_offset_shifts_origin() {
        // A tiepoint anchored one cell in from the corner still recovers
        // the true top-left origin
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).unwrap();
            let mut image = encoder.new_image::<Gray32Float>(2, 2).unwrap();
            image
                .encoder()
                .write_tag(Tag::Unknown(TAG_MODEL_PIXEL_SCALE), &[10.0, 10.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(
                    Tag::Unknown(TAG_MODEL_TIEPOINT),
                    &[1.0, 1.0, 0.0, 110.0, 190.0, 0.0][..],
                )
                .unwrap();
            image.write_data(&[1.0_f32, 2.0, 3.0, 4.0]).unwrap();
        }

        buffer.set_position(0);
        let coverage = decode_geotiff(buffer, &Crs::epsg(27700)).unwrap();
        let envelope = coverage.envelope();
        assert_eq!(envelope.min_x, 100.0);
        assert_eq!(envelope.max_y, 200.0);
        assert_eq!(envelope.max_x, 120.0);
        assert_eq!(envelope.min_y, 180.0);
    }

    #[test]
    fn test_geo_keys_embed_epsg_code() {
        let keys = geo_keys(&Crs::epsg(27700));
        assert_eq!(keys[3], 3);
        assert_eq!(keys[keys.len() - 2], 1);
        assert_eq!(keys[keys.len() - 1], 27700);

        let keys = geo_keys(&Crs::new("OSGB36"));
        assert_eq!(keys[3], 2);
    }
}
