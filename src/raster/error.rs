//! Raster adapter error types.

use thiserror::Error;

/// Errors from the decode/encode adapters.
#[derive(Debug, Clone, Error)]
pub enum RasterError {
    /// The byte payload is not in a recognizable bitmap container
    #[error("unrecognized image format")]
    UnsupportedFormat,

    /// The container was recognized but the payload could not be decoded
    #[error("failed to decode image: {message}")]
    DecodeFailed { message: String },

    /// Encoding the surface to the target format failed
    #[error("failed to encode to {format}: {message}")]
    EncodeFailed { format: String, message: String },

    /// A surface with zero width or height was supplied
    #[error("invalid geometry: {width}x{height} surface")]
    InvalidGeometry { width: u32, height: u32 },
}

impl RasterError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        RasterError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        RasterError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }
}
