//! Raster decode/encode adapters.
//!
//! Everything that crosses the byte boundary lives here: turning uploaded
//! bytes into a pixel-accessible surface, and turning a composited surface
//! back into lossless-preferred output bytes.
//!
//! # Example
//!
//! ```ignore
//! use selo::raster::{self, EncoderFactory, OutputFormat, CompressionLevel};
//!
//! let base = raster::decode(&bytes)?;
//! let encoder = EncoderFactory::create(OutputFormat::Png);
//! let encoded = encoder.encode(&base, CompressionLevel::Balanced)?;
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;

pub use decoder::decode;
pub use encoder::{
    CompressionLevel, EncodedImage, EncoderFactory, ImageEncoder, OutputFormat, PngEncoder,
    WebPEncoder,
};
pub use error::RasterError;

use image::RgbaImage;

/// Decoded bitmap with known pixel dimensions.
///
/// Immutable once decoded; compositing always produces a new surface
/// instead of mutating an existing one, so the same decoded image can be
/// reprocessed with different settings without re-decoding.
#[derive(Clone)]
pub struct RasterImage {
    surface: RgbaImage,
}

impl RasterImage {
    /// Wrap an RGBA surface.
    pub fn from_surface(surface: RgbaImage) -> Self {
        Self { surface }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.surface.width() == 0 || self.surface.height() == 0
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn into_surface(self) -> RgbaImage {
        self.surface
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("dimensions", &(self.width(), self.height()))
            .finish()
    }
}
