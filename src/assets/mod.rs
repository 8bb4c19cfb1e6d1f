//! In-session asset model.
//!
//! Holds the uploaded images and logos for the lifetime of one session.
//! Nothing here survives process restart; removing an asset releases its
//! decoded surfaces immediately rather than waiting on collection.
//!
//! # Invariants
//!
//! - At most one logo is selected at a time.
//! - An image's `processed` slot is replaced wholesale by a successful
//!   run and left untouched by a failed one.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::raster::{self, OutputFormat, RasterImage};

/// Maximum edge length for stored image thumbnails.
///
/// Keeps the store's memory proportional to thumbnail size rather than
/// full decoded frames; the batch pipeline re-decodes each image at full
/// resolution one at a time.
const PREVIEW_MAX_EDGE: u32 = 256;

fn default_scale_fraction() -> f32 {
    0.15
}

fn default_opacity_fraction() -> f32 {
    0.8
}

fn default_margin_fraction() -> f32 {
    0.02
}

/// Unique, session-stable identifier for an uploaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sizing, opacity and margin knobs shared by the batch and interactive
/// paths.
///
/// `scale_fraction` multiplies the logo's own natural width; the target
/// height always follows the logo's aspect ratio, never the base image's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    /// Logo size as a fraction of its natural size, in (0, 1] (default: 0.15)
    #[serde(default = "default_scale_fraction")]
    pub scale_fraction: f32,

    /// Uniform logo opacity in [0, 1] (default: 0.8)
    #[serde(default = "default_opacity_fraction")]
    pub opacity_fraction: f32,

    /// Edge margin as a fraction of the base image's shorter side, in [0, 1)
    /// (default: 0.02)
    #[serde(default = "default_margin_fraction")]
    pub margin_fraction: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            scale_fraction: default_scale_fraction(),
            opacity_fraction: default_opacity_fraction(),
            margin_fraction: default_margin_fraction(),
        }
    }
}

impl WatermarkOptions {
    /// Validate the option ranges.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.scale_fraction.is_finite()
            || self.scale_fraction <= 0.0
            || self.scale_fraction > 1.0
        {
            return Err(EngineError::Config(format!(
                "scale_fraction must be a finite value in (0, 1], got {}",
                self.scale_fraction
            )));
        }
        if !self.opacity_fraction.is_finite() || !(0.0..=1.0).contains(&self.opacity_fraction) {
            return Err(EngineError::Config(format!(
                "opacity_fraction must be a finite value between 0.0 and 1.0, got {}",
                self.opacity_fraction
            )));
        }
        if !self.margin_fraction.is_finite() || !(0.0..1.0).contains(&self.margin_fraction) {
            return Err(EngineError::Config(format!(
                "margin_fraction must be a finite value in [0, 1), got {}",
                self.margin_fraction
            )));
        }
        Ok(())
    }
}

/// Encoded result of one successful compositing run.
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    /// Output filename derived from the source asset's name
    pub filename: String,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// One uploaded source image.
pub struct ImageAsset {
    pub id: AssetId,
    pub name: String,
    pub source: Bytes,
    /// Downscaled thumbnail for list rendering
    pub preview: Arc<RasterImage>,
    /// Set exactly once per successful run; replaced wholesale by later runs
    pub processed: Option<ProcessedOutput>,
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("processed", &self.processed.is_some())
            .finish()
    }
}

/// One uploaded logo.
pub struct LogoAsset {
    pub id: AssetId,
    pub display_name: String,
    pub source: Bytes,
    /// Full-resolution decoded logo, shared read-only with compositing runs
    pub raster: Arc<RasterImage>,
}

impl fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoAsset")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("dimensions", &(self.raster.width(), self.raster.height()))
            .finish()
    }
}

fn thumbnail(raster: &RasterImage) -> RasterImage {
    let (w, h) = (raster.width(), raster.height());
    if w <= PREVIEW_MAX_EDGE && h <= PREVIEW_MAX_EDGE {
        return raster.clone();
    }
    let scale = f64::from(PREVIEW_MAX_EDGE) / f64::from(w.max(h));
    let tw = ((f64::from(w) * scale).round() as u32).max(1);
    let th = ((f64::from(h) * scale).round() as u32).max(1);
    let surface = image::imageops::resize(
        raster.surface(),
        tw,
        th,
        image::imageops::FilterType::Triangle,
    );
    RasterImage::from_surface(surface)
}

/// Container for the session's uploaded assets.
#[derive(Debug, Default)]
pub struct AssetStore {
    images: Vec<ImageAsset>,
    logos: Vec<LogoAsset>,
    selected_logo: Option<AssetId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and register an uploaded image.
    pub fn add_image(
        &mut self,
        name: impl Into<String>,
        source: Bytes,
    ) -> Result<AssetId, EngineError> {
        let raster = raster::decode(&source)?;
        let id = AssetId::new();
        self.images.push(ImageAsset {
            id,
            name: name.into(),
            source,
            preview: Arc::new(thumbnail(&raster)),
            processed: None,
        });
        Ok(id)
    }

    /// Decode and register an uploaded logo.
    ///
    /// The first logo added becomes the selected one.
    pub fn add_logo(
        &mut self,
        display_name: impl Into<String>,
        source: Bytes,
    ) -> Result<AssetId, EngineError> {
        let raster = raster::decode(&source)?;
        let id = AssetId::new();
        self.logos.push(LogoAsset {
            id,
            display_name: display_name.into(),
            source,
            raster: Arc::new(raster),
        });
        if self.selected_logo.is_none() {
            self.selected_logo = Some(id);
        }
        Ok(id)
    }

    pub fn image(&self, id: AssetId) -> Option<&ImageAsset> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn logo(&self, id: AssetId) -> Option<&LogoAsset> {
        self.logos.iter().find(|logo| logo.id == id)
    }

    pub fn logos(&self) -> impl Iterator<Item = &LogoAsset> {
        self.logos.iter()
    }

    /// Mark a logo as the one used by subsequent compositing calls.
    pub fn select_logo(&mut self, id: AssetId) -> Result<(), EngineError> {
        if self.logo(id).is_none() {
            return Err(EngineError::Asset(format!("unknown logo asset: {id}")));
        }
        self.selected_logo = Some(id);
        Ok(())
    }

    pub fn selected_logo(&self) -> Option<&LogoAsset> {
        self.selected_logo.and_then(|id| self.logo(id))
    }

    /// Remove an image, releasing its decoded surfaces.
    pub fn remove_image(&mut self, id: AssetId) -> bool {
        let before = self.images.len();
        self.images.retain(|img| img.id != id);
        self.images.len() != before
    }

    /// Remove a logo, releasing its decoded surface.
    ///
    /// If the removed logo was selected, selection falls back to the
    /// first remaining logo.
    pub fn remove_logo(&mut self, id: AssetId) -> bool {
        let before = self.logos.len();
        self.logos.retain(|logo| logo.id != id);
        let removed = self.logos.len() != before;
        if removed && self.selected_logo == Some(id) {
            self.selected_logo = self.logos.first().map(|logo| logo.id);
        }
        removed
    }

    /// Replace an image's processed output after a successful run.
    pub fn record_processed(&mut self, id: AssetId, output: ProcessedOutput) -> bool {
        match self.images.iter_mut().find(|img| img.id == id) {
            Some(img) => {
                img.processed = Some(output);
                true
            }
            None => false,
        }
    }
}
