//! Image decoding: uploaded bytes to a pixel-accessible surface.

use std::io::Cursor;

use image::io::Reader as ImageReader;

use super::error::RasterError;
use super::RasterImage;

/// Decode image bytes into a [`RasterImage`].
///
/// The container format is sniffed from the payload, so callers never
/// need to pass a format hint.
///
/// # Errors
///
/// * [`RasterError::UnsupportedFormat`] when the bytes are not in any
///   recognizable bitmap container
/// * [`RasterError::DecodeFailed`] when the container is recognized but
///   the pixel data is corrupt or truncated
/// * [`RasterError::InvalidGeometry`] when the decoded surface has a
///   zero dimension
pub fn decode(data: &[u8]) -> Result<RasterImage, RasterError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RasterError::decode_failed(e.to_string()))?;

    if reader.format().is_none() {
        return Err(RasterError::UnsupportedFormat);
    }

    let decoded = reader
        .decode()
        .map_err(|e| RasterError::decode_failed(e.to_string()))?;

    let surface = decoded.to_rgba8();
    if surface.width() == 0 || surface.height() == 0 {
        return Err(RasterError::InvalidGeometry {
            width: surface.width(),
            height: surface.height(),
        });
    }

    Ok(RasterImage::from_surface(surface))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode_test_image(format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let mut buffer = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, format)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let raster = decode(&encode_test_image(ImageFormat::Png)).unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 4));
    }

    #[test]
    fn test_decode_jpeg() {
        let raster = decode(&encode_test_image(ImageFormat::Jpeg)).unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 4));
    }

    #[test]
    fn test_decode_preserves_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 128]));
        let mut buffer = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();

        let raster = decode(&buffer.into_inner()).unwrap();
        assert_eq!(raster.surface().get_pixel(0, 0)[3], 128);
    }

    #[test]
    fn test_decode_garbage_is_unsupported_format() {
        let result = decode(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert!(matches!(result, Err(RasterError::UnsupportedFormat)));
    }

    #[test]
    fn test_decode_truncated_png_fails() {
        let mut bytes = encode_test_image(ImageFormat::Png);
        bytes.truncate(bytes.len() / 2);
        let result = decode(&bytes);
        assert!(matches!(result, Err(RasterError::DecodeFailed { .. })));
    }
}
