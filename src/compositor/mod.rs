//! Alpha compositing of a logo onto a base surface.
//!
//! The output surface always has the base image's dimensions. The base is
//! drawn 1:1; the logo is resampled into its resolved box with a bilinear
//! filter and blended with the Porter-Duff "over" operator. Neither input
//! surface is mutated, so the same decoded pair can be recomposited with
//! different settings without re-decoding.

use std::num::NonZeroU32;

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::placement::ResolvedPlacement;
use crate::raster::RasterImage;

/// Errors from the compositing stage.
#[derive(Debug, Clone, Error)]
pub enum CompositeError {
    /// An input surface has zero width or height
    #[error("invalid geometry: {role} surface is {width}x{height}")]
    InvalidGeometry {
        role: &'static str,
        width: u32,
        height: u32,
    },

    /// Resampling the logo to its target box failed
    #[error("failed to resample logo: {message}")]
    Resample { message: String },
}

fn ensure_nonzero(surface: &RasterImage, role: &'static str) -> Result<(), CompositeError> {
    if surface.is_empty() {
        return Err(CompositeError::InvalidGeometry {
            role,
            width: surface.width(),
            height: surface.height(),
        });
    }
    Ok(())
}

/// Composite `logo` over `base` at the resolved placement box.
///
/// `opacity` applies uniformly on top of the logo's own alpha channel.
/// Returns a new surface with the base image's exact dimensions.
pub fn composite(
    base: &RasterImage,
    logo: &RasterImage,
    placement: &ResolvedPlacement,
    opacity: f32,
) -> Result<RasterImage, CompositeError> {
    ensure_nonzero(base, "base")?;
    ensure_nonzero(logo, "logo")?;

    let scaled = if logo.width() == placement.width && logo.height() == placement.height {
        logo.surface().clone()
    } else {
        resample(logo.surface(), placement.width, placement.height)?
    };

    let mut output = base.surface().clone();
    blend_region(&mut output, &scaled, placement.x, placement.y, opacity);

    Ok(RasterImage::from_surface(output))
}

/// Resample an RGBA surface to the target dimensions with a bilinear
/// filter.
pub(crate) fn resample(
    surface: &RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, CompositeError> {
    let resample_failed = |message: String| CompositeError::Resample { message };

    let src_width = NonZeroU32::new(surface.width())
        .ok_or_else(|| resample_failed("source width is 0".to_string()))?;
    let src_height = NonZeroU32::new(surface.height())
        .ok_or_else(|| resample_failed("source height is 0".to_string()))?;
    let dst_width = NonZeroU32::new(target_w)
        .ok_or_else(|| resample_failed("target width is 0".to_string()))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| resample_failed("target height is 0".to_string()))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        surface.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| resample_failed(format!("failed to create source view: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| resample_failed(format!("resize operation failed: {:?}", e)))?;

    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| resample_failed("failed to assemble output buffer".to_string()))
}

/// Blend `overlay` onto `target` at the given offset.
///
/// The drawn region is clipped to the target bounds, so an overlay that
/// overflows the right or bottom edge is partially drawn.
fn blend_region(target: &mut RgbaImage, overlay: &RgbaImage, x: u32, y: u32, opacity: f32) {
    let x_end = (x + overlay.width()).min(target.width());
    let y_end = (y + overlay.height()).min(target.height());

    for ty in y..y_end {
        for tx in x..x_end {
            let over = overlay.get_pixel(tx - x, ty - y);
            let under = target.get_pixel(tx, ty);
            let blended = blend_pixel(*under, *over, opacity);
            target.put_pixel(tx, ty, blended);
        }
    }
}

/// Porter-Duff "over" with an extra uniform opacity on the foreground.
fn blend_pixel(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);
    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |fg: u8, bg: u8| -> u8 {
        let fg = fg as f32 / 255.0;
        let bg = bg as f32 / 255.0;
        let out = (fg * fg_alpha + bg * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (out * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(foreground[0], background[0]),
        channel(foreground[1], background[1]),
        channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
