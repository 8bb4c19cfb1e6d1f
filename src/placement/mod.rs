//! Placement resolution for logo compositing.
//!
//! Turns a [`PlacementSpec`] plus the sizing options into the concrete
//! pixel box a logo is drawn into. Two conventions that used to diverge
//! across call paths are unified here:
//!
//! - scale is always a fraction of the logo's own natural size, so logo
//!   sizing never depends on the base image's dimensions;
//! - fraction-form custom coordinates name the logo's **center**, while
//!   pixel-form custom coordinates name its top-left directly.
//!
//! # Example
//!
//! ```ignore
//! use selo::placement::{resolve, Corner, PixelSize, PlacementSpec};
//!
//! let spec = PlacementSpec::Anchored { corner: Corner::BottomRight, margin_fraction: 0.02 };
//! let placed = resolve(PixelSize::new(1000, 800), PixelSize::new(200, 100), &spec, &options);
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assets::WatermarkOptions;

fn default_margin_fraction() -> f32 {
    0.02
}

/// Anchor corner for derived placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Where the logo goes, before any pixel math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PlacementSpec {
    /// Position derived from a named corner plus an edge margin
    Anchored {
        corner: Corner,
        /// Margin as a fraction of the base image's shorter side
        #[serde(default = "default_margin_fraction")]
        margin_fraction: f32,
    },
    /// Explicit coordinates as percent of each base dimension (0-100),
    /// naming the logo's center
    CustomFraction { x: f32, y: f32 },
    /// Explicit top-left coordinates in base-image pixels
    CustomPixels { x: u32, y: u32 },
}

impl Default for PlacementSpec {
    fn default() -> Self {
        PlacementSpec::Anchored {
            corner: Corner::BottomRight,
            margin_fraction: default_margin_fraction(),
        }
    }
}

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Resolved pixel box at which the logo is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPlacement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Target logo dimensions for a scale fraction.
///
/// Width is `logo.width * scale_fraction`; height follows the logo's own
/// aspect ratio. Both are at least one pixel.
pub fn scaled_logo_size(logo: PixelSize, scale_fraction: f32) -> (u32, u32) {
    let width = (f64::from(logo.width) * f64::from(scale_fraction))
        .round()
        .max(1.0);
    let height = (width * f64::from(logo.height) / f64::from(logo.width.max(1)))
        .round()
        .max(1.0);
    (width as u32, height as u32)
}

/// Resolve a placement spec into the pixel box the logo occupies.
///
/// Pure and deterministic. The final top-left is clamped into
/// `[0, base - logo]` on each axis; when the scaled logo exceeds the base
/// in a dimension the lower bound wins, so an oversized logo overflows
/// visibly instead of erroring.
pub fn resolve(
    base: PixelSize,
    logo: PixelSize,
    spec: &PlacementSpec,
    options: &WatermarkOptions,
) -> ResolvedPlacement {
    let (logo_w, logo_h) = scaled_logo_size(logo, options.scale_fraction);

    if logo_w > base.width || logo_h > base.height {
        warn!(
            logo_width = logo_w,
            logo_height = logo_h,
            base_width = base.width,
            base_height = base.height,
            "scaled logo exceeds base image bounds; clamping placement"
        );
    }

    let base_w = i64::from(base.width);
    let base_h = i64::from(base.height);
    let w = i64::from(logo_w);
    let h = i64::from(logo_h);

    let (x, y) = match spec {
        PlacementSpec::Anchored {
            corner,
            margin_fraction,
        } => {
            let margin = (f64::from(base.width.min(base.height)) * f64::from(*margin_fraction))
                .round() as i64;
            match corner {
                Corner::TopLeft => (margin, margin),
                Corner::TopRight => (base_w - w - margin, margin),
                Corner::BottomLeft => (margin, base_h - h - margin),
                Corner::BottomRight => (base_w - w - margin, base_h - h - margin),
            }
        }
        PlacementSpec::CustomFraction { x, y } => {
            let cx = f64::from(*x) / 100.0 * base_w as f64;
            let cy = f64::from(*y) / 100.0 * base_h as f64;
            (
                (cx - w as f64 / 2.0).round() as i64,
                (cy - h as f64 / 2.0).round() as i64,
            )
        }
        PlacementSpec::CustomPixels { x, y } => (i64::from(*x), i64::from(*y)),
    };

    let max_x = (base_w - w).max(0);
    let max_y = (base_h - h).max(0);

    ResolvedPlacement {
        x: x.clamp(0, max_x) as u32,
        y: y.clamp(0, max_y) as u32,
        width: logo_w,
        height: logo_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn options(scale: f32) -> WatermarkOptions {
        WatermarkOptions {
            scale_fraction: scale,
            ..Default::default()
        }
    }

    // Test: scaled size follows the logo's own aspect ratio
    #[test]
    fn test_scaled_size_is_fraction_of_logo() {
        let (w, h) = scaled_logo_size(PixelSize::new(200, 100), 0.15);
        assert_eq!((w, h), (30, 15));
    }

    #[test]
    fn test_scaled_size_full_scale_is_natural_size() {
        let (w, h) = scaled_logo_size(PixelSize::new(320, 180), 1.0);
        assert_eq!((w, h), (320, 180));
    }

    #[test]
    fn test_scaled_size_never_collapses_to_zero() {
        let (w, h) = scaled_logo_size(PixelSize::new(40, 10), 0.01);
        assert!(w >= 1 && h >= 1);
    }

    // Test: all four corners with zero margin touch the base corners exactly
    #[rstest]
    #[case(Corner::TopLeft, (0, 0))]
    #[case(Corner::TopRight, (900, 0))]
    #[case(Corner::BottomLeft, (0, 750))]
    #[case(Corner::BottomRight, (900, 750))]
    fn test_corner_with_zero_margin(#[case] corner: Corner, #[case] expected: (u32, u32)) {
        let spec = PlacementSpec::Anchored {
            corner,
            margin_fraction: 0.0,
        };
        let placed = resolve(
            PixelSize::new(1000, 800),
            PixelSize::new(100, 50),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), expected);
        assert_eq!((placed.width, placed.height), (100, 50));
    }

    // Test: margin is a fraction of the shorter base side
    #[test]
    fn test_margin_uses_shorter_side() {
        let spec = PlacementSpec::Anchored {
            corner: Corner::TopLeft,
            margin_fraction: 0.02,
        };
        let placed = resolve(
            PixelSize::new(1000, 800),
            PixelSize::new(100, 50),
            &spec,
            &options(1.0),
        );
        // 800 * 0.02 = 16 on both axes
        assert_eq!((placed.x, placed.y), (16, 16));
    }

    #[test]
    fn test_bottom_right_with_margin_and_scale() {
        let spec = PlacementSpec::Anchored {
            corner: Corner::BottomRight,
            margin_fraction: 0.02,
        };
        let placed = resolve(
            PixelSize::new(1000, 800),
            PixelSize::new(200, 100),
            &spec,
            &options(0.15),
        );
        assert_eq!(placed, ResolvedPlacement {
            x: 954,
            y: 769,
            width: 30,
            height: 15,
        });
    }

    // Test: fraction coordinates name the logo center
    #[test]
    fn test_custom_fraction_is_center_anchored() {
        let spec = PlacementSpec::CustomFraction { x: 50.0, y: 50.0 };
        let placed = resolve(
            PixelSize::new(400, 400),
            PixelSize::new(100, 60),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (150, 170));
    }

    #[test]
    fn test_custom_fraction_origin_clamps_to_zero() {
        let spec = PlacementSpec::CustomFraction { x: 0.0, y: 0.0 };
        let placed = resolve(
            PixelSize::new(400, 400),
            PixelSize::new(100, 60),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (0, 0));
    }

    #[test]
    fn test_custom_fraction_bottom_right_corner_clamps() {
        let spec = PlacementSpec::CustomFraction { x: 100.0, y: 100.0 };
        let placed = resolve(
            PixelSize::new(400, 400),
            PixelSize::new(100, 60),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (300, 340));
    }

    // Test: pixel coordinates are top-left anchored, no centering
    #[test]
    fn test_custom_pixels_is_top_left_anchored() {
        let spec = PlacementSpec::CustomPixels { x: 25, y: 40 };
        let placed = resolve(
            PixelSize::new(400, 400),
            PixelSize::new(100, 60),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (25, 40));
    }

    #[test]
    fn test_custom_pixels_clamps_to_fit() {
        let spec = PlacementSpec::CustomPixels { x: 390, y: 390 };
        let placed = resolve(
            PixelSize::new(400, 400),
            PixelSize::new(100, 60),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (300, 340));
    }

    // Test: oversized logo clamps to origin instead of erroring
    #[test]
    fn test_oversized_logo_clamps_to_origin() {
        let spec = PlacementSpec::Anchored {
            corner: Corner::BottomRight,
            margin_fraction: 0.05,
        };
        let placed = resolve(
            PixelSize::new(100, 100),
            PixelSize::new(300, 200),
            &spec,
            &options(1.0),
        );
        assert_eq!((placed.x, placed.y), (0, 0));
        assert_eq!((placed.width, placed.height), (300, 200));
    }

    // Test: identical inputs resolve identically
    #[test]
    fn test_resolution_is_deterministic() {
        let spec = PlacementSpec::CustomFraction { x: 33.3, y: 66.6 };
        let base = PixelSize::new(1234, 987);
        let logo = PixelSize::new(321, 123);
        let first = resolve(base, logo, &spec, &options(0.4));
        let second = resolve(base, logo, &spec, &options(0.4));
        assert_eq!(first, second);
    }

    // Test: serde naming for config files
    #[test]
    fn test_spec_deserializes_from_kebab_case() {
        let spec: PlacementSpec =
            serde_yaml::from_str("mode: anchored\ncorner: bottom-right\n").unwrap();
        assert_eq!(
            spec,
            PlacementSpec::Anchored {
                corner: Corner::BottomRight,
                margin_fraction: 0.02,
            }
        );

        let spec: PlacementSpec =
            serde_yaml::from_str("mode: custom-fraction\nx: 24.0\ny: 20.0\n").unwrap();
        assert_eq!(spec, PlacementSpec::CustomFraction { x: 24.0, y: 20.0 });
    }
}
