// Configuration module

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::WatermarkOptions;
use crate::error::EngineError;
use crate::placement::PlacementSpec;
use crate::raster::{CompressionLevel, OutputFormat};

fn default_preview_max_width() -> u32 {
    960
}

fn default_preview_max_height() -> u32 {
    600
}

/// Bounding box for the interactive preview surface.
///
/// The preview is scaled to fit inside this box and is never upscaled
/// past the source image's native resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewBounds {
    #[serde(default = "default_preview_max_width")]
    pub max_width: u32,

    #[serde(default = "default_preview_max_height")]
    pub max_height: u32,
}

impl Default for PreviewBounds {
    fn default() -> Self {
        Self {
            max_width: default_preview_max_width(),
            max_height: default_preview_max_height(),
        }
    }
}

/// One watermarking job: where the logo goes, how it is sized, and how
/// outputs are encoded.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobConfig {
    #[serde(default)]
    pub placement: PlacementSpec,

    #[serde(default)]
    pub options: WatermarkOptions,

    #[serde(default)]
    pub output_format: OutputFormat,

    #[serde(default)]
    pub compression: CompressionLevel,

    #[serde(default)]
    pub preview: PreviewBounds,
}

impl JobConfig {
    /// Load and validate a job configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: JobConfig = serde_yaml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("invalid YAML in {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate option ranges and the placement spec.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.options.validate()?;

        match self.placement {
            PlacementSpec::Anchored { margin_fraction, .. } => {
                if !margin_fraction.is_finite() || !(0.0..1.0).contains(&margin_fraction) {
                    return Err(EngineError::Config(format!(
                        "placement margin_fraction must be a finite value in [0, 1), got {margin_fraction}"
                    )));
                }
            }
            PlacementSpec::CustomFraction { x, y } => {
                for (axis, value) in [("x", x), ("y", y)] {
                    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                        return Err(EngineError::Config(format!(
                            "placement {axis} must be a finite percentage between 0 and 100, got {value}"
                        )));
                    }
                }
            }
            PlacementSpec::CustomPixels { .. } => {}
        }

        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(EngineError::Config(format!(
                "preview bounds must be non-zero, got {}x{}",
                self.preview.max_width, self.preview.max_height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Corner;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(JobConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: JobConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.preview, PreviewBounds::default());
        assert_eq!(
            config.placement,
            PlacementSpec::Anchored {
                corner: Corner::BottomRight,
                margin_fraction: 0.02,
            }
        );
    }

    #[test]
    fn test_full_yaml_round_trip() {
        let yaml = r#"
placement:
  mode: custom-fraction
  x: 24.0
  y: 20.0
options:
  scale_fraction: 0.3
  opacity_fraction: 0.9
output_format: webp
compression: best
preview:
  max_width: 500
  max_height: 400
"#;
        let config: JobConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.placement, PlacementSpec::CustomFraction { x: 24.0, y: 20.0 });
        assert_eq!(config.options.scale_fraction, 0.3);
        // Omitted option falls back to its default
        assert_eq!(config.options.margin_fraction, 0.02);
        assert_eq!(config.output_format, OutputFormat::WebP);
        assert_eq!(config.compression, CompressionLevel::Best);
        assert_eq!(config.preview.max_width, 500);
    }

    #[test]
    fn test_out_of_range_custom_fraction_is_rejected() {
        let config = JobConfig {
            placement: PlacementSpec::CustomFraction { x: 130.0, y: 20.0 },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("between 0 and 100"));
    }

    #[test]
    fn test_out_of_range_margin_is_rejected() {
        let config = JobConfig {
            placement: PlacementSpec::Anchored {
                corner: Corner::TopLeft,
                margin_fraction: 1.5,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_preview_bounds_are_rejected() {
        let config = JobConfig {
            preview: PreviewBounds {
                max_width: 0,
                max_height: 600,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing_path_is_config_error() {
        let result = JobConfig::from_file(Path::new("/nonexistent/selo.yaml"));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_from_file_rejects_out_of_range_options() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "options:\n  opacity_fraction: 2.0").unwrap();
        let result = JobConfig::from_file(file.path());
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
