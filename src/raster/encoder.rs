//! Image encoder abstraction
//!
//! Trait-based encoder system over the lossless-preferred output formats.
//! Compression level is configuration, not semantics: every level yields
//! pixel-identical output for the supported formats.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use super::error::RasterError;
use super::RasterImage;

/// Output container for composited surfaces.
///
/// Both supported formats are lossless and keep the alpha channel of the
/// composited result intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    WebP,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }
}

/// Speed/size trade-off for encoders that expose one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Fast,
    #[default]
    Balanced,
    Best,
}

/// Result of encoding a surface.
#[derive(Debug)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Vec<u8>,
    /// The output format
    pub format: OutputFormat,
    /// Content-Type value for downstream collaborators
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn new(data: Vec<u8>, format: OutputFormat) -> Self {
        let content_type = format.content_type();
        Self {
            data,
            format,
            content_type,
        }
    }
}

/// Trait for image encoders.
///
/// Object-safe so the factory can hand back dynamic encoders chosen from
/// configuration.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode a surface to the target format.
    ///
    /// # Errors
    ///
    /// * [`RasterError::InvalidGeometry`] when the surface has a zero dimension
    /// * [`RasterError::EncodeFailed`] when serialization fails
    fn encode(
        &self,
        surface: &RasterImage,
        compression: CompressionLevel,
    ) -> Result<EncodedImage, RasterError>;
}

fn ensure_nonzero(surface: &RasterImage) -> Result<(), RasterError> {
    if surface.is_empty() {
        return Err(RasterError::InvalidGeometry {
            width: surface.width(),
            height: surface.height(),
        });
    }
    Ok(())
}

/// PNG encoder using the image crate.
///
/// Deterministic for identical input, which is what makes repeated runs
/// of the same composition byte-identical.
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(
        &self,
        surface: &RasterImage,
        compression: CompressionLevel,
    ) -> Result<EncodedImage, RasterError> {
        use image::codecs::png::{CompressionType, FilterType, PngEncoder as ImagePngEncoder};
        use image::ImageEncoder as _;

        ensure_nonzero(surface)?;

        let compression_type = match compression {
            CompressionLevel::Fast => CompressionType::Fast,
            CompressionLevel::Balanced => CompressionType::Default,
            CompressionLevel::Best => CompressionType::Best,
        };

        let mut output = Cursor::new(Vec::new());
        let encoder =
            ImagePngEncoder::new_with_quality(&mut output, compression_type, FilterType::Adaptive);

        encoder
            .write_image(
                surface.surface().as_raw(),
                surface.width(),
                surface.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| RasterError::encode_failed("png", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::Png))
    }
}

/// Lossless WebP encoder using the image crate.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(
        &self,
        surface: &RasterImage,
        _compression: CompressionLevel,
    ) -> Result<EncodedImage, RasterError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;
        use image::ImageEncoder as _;

        ensure_nonzero(surface)?;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageWebPEncoder::new_lossless(&mut output);

        encoder
            .write_image(
                surface.surface().as_raw(),
                surface.width(),
                surface.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| RasterError::encode_failed("webp", e.to_string()))?;

        Ok(EncodedImage::new(output.into_inner(), OutputFormat::WebP))
    }
}

/// Factory for creating encoders based on output format.
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}
