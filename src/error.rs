// Error types module

use thiserror::Error;

use crate::compositor::CompositeError;
use crate::export::ExportError;
use crate::raster::RasterError;

/// Centralized error type for the engine
///
/// Categorizes errors so callers (the CLI, the batch event stream) can
/// report a distinguishable reason for every failure path.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Input bytes could not be decoded into a raster surface
    #[error("decode error: {0}")]
    Decode(String),

    /// A surface had zero width or height
    #[error("geometry error: {0}")]
    Geometry(String),

    /// A composited surface could not be serialized
    #[error("encode error: {0}")]
    Encode(String),

    /// Invalid job configuration (bad YAML, out-of-range option, etc.)
    #[error("configuration error: {0}")]
    Config(String),

    /// Asset store lookup or lifecycle failures (unknown id, no selection)
    #[error("asset error: {0}")]
    Asset(String),

    /// Delivery to an export sink failed
    #[error("export error: {0}")]
    Export(String),

    /// Unexpected internal errors (task join failures, resampler faults)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RasterError> for EngineError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::UnsupportedFormat | RasterError::DecodeFailed { .. } => {
                Self::Decode(err.to_string())
            }
            RasterError::InvalidGeometry { .. } => Self::Geometry(err.to_string()),
            RasterError::EncodeFailed { .. } => Self::Encode(err.to_string()),
        }
    }
}

impl From<CompositeError> for EngineError {
    fn from(err: CompositeError) -> Self {
        match err {
            CompositeError::InvalidGeometry { .. } => Self::Geometry(err.to_string()),
            CompositeError::Resample { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<ExportError> for EngineError {
    fn from(err: ExportError) -> Self {
        Self::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_errors_map_to_decode_category() {
        let err: EngineError = RasterError::DecodeFailed {
            message: "truncated stream".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Decode(_)));
        assert!(err.to_string().contains("truncated stream"));

        let err: EngineError = RasterError::UnsupportedFormat.into();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn test_zero_sized_surface_maps_to_geometry_category() {
        let err: EngineError = RasterError::InvalidGeometry {
            width: 0,
            height: 32,
        }
        .into();
        assert!(matches!(err, EngineError::Geometry(_)));
    }

    #[test]
    fn test_encode_errors_map_to_encode_category() {
        let err: EngineError = RasterError::EncodeFailed {
            format: "png".to_string(),
            message: "write failed".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Encode(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
