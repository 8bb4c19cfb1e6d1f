//! Interactive placement editing for one image/logo pair.
//!
//! A session decodes both inputs once, then lets the caller drag, scale
//! and fade the logo against a display-scaled preview. Committing
//! re-renders the identical composition at full source resolution from
//! the rasters decoded at open time; nothing is ever re-decoded.
//!
//! The adjustable state lives in percent-of-dimension space, so the
//! stored position is independent of the preview's resolution.
//!
//! # Lifecycle
//!
//! `open` decodes both inputs; a decode failure is fatal to the session
//! and surfaces immediately. A live session moves between ready and
//! dragging as the pointer interacts with the logo, and ends in exactly
//! one of committed (full-resolution output produced) or discarded
//! (previews released, no output).

use std::sync::Arc;

use thiserror::Error;
use tokio::task;
use tracing::debug;

use crate::assets::WatermarkOptions;
use crate::compositor::{self, CompositeError};
use crate::config::JobConfig;
use crate::placement::{self, PixelSize, PlacementSpec};
use crate::raster::{self, CompressionLevel, EncoderFactory, OutputFormat, RasterError, RasterImage};

const DEFAULT_POSITION: (f32, f32) = (80.0, 80.0);
const DEFAULT_SCALE_FRACTION: f32 = 0.15;
const DEFAULT_OPACITY_FRACTION: f32 = 0.9;

/// Errors from the interactive session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("failed to decode source image: {0}")]
    ImageDecode(RasterError),

    #[error("failed to decode logo: {0}")]
    LogoDecode(RasterError),

    /// The session has already been committed or discarded
    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Composite(#[from] CompositeError),

    #[error("failed to encode committed image: {0}")]
    Encode(RasterError),

    #[error("session task failed: {0}")]
    Task(String),
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Dragging,
    Committed,
    Discarded,
}

/// One atomic read of the adjustable state, taken at commit time.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot {
    /// Logo center in percent of each base dimension
    pub position: (f32, f32),
    pub scale_fraction: f32,
    pub opacity_fraction: f32,
}

/// Stateful editor for one image/logo pair.
pub struct InteractiveSession {
    base: Arc<RasterImage>,
    logo: Arc<RasterImage>,
    margin_fraction: f32,
    output_format: OutputFormat,
    compression: CompressionLevel,
    /// Preview scale relative to source pixels, in (0, 1]
    display_scale: f32,
    position: (f32, f32),
    scale_fraction: f32,
    opacity_fraction: f32,
    grab_offset: (f32, f32),
    state: SessionState,
}

impl std::fmt::Debug for InteractiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveSession")
            .field("base", &(self.base.width(), self.base.height()))
            .field("display_scale", &self.display_scale)
            .field("position", &self.position)
            .field("state", &self.state)
            .finish()
    }
}

impl InteractiveSession {
    /// Decode both inputs and open a session.
    ///
    /// A decode failure of either input is fatal: no session value
    /// exists and the error names which input failed.
    pub async fn open(
        image_bytes: Vec<u8>,
        logo_bytes: Vec<u8>,
        config: &JobConfig,
    ) -> Result<Self, SessionError> {
        let decoded = task::spawn_blocking(move || {
            let base = raster::decode(&image_bytes).map_err(SessionError::ImageDecode)?;
            let logo = raster::decode(&logo_bytes).map_err(SessionError::LogoDecode)?;
            Ok::<_, SessionError>((base, logo))
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))??;
        let (base, logo) = decoded;

        let bounds = config.preview;
        let display_scale = (f64::from(bounds.max_width) / f64::from(base.width()))
            .min(f64::from(bounds.max_height) / f64::from(base.height()))
            .min(1.0) as f32;

        debug!(
            base_width = base.width(),
            base_height = base.height(),
            logo_width = logo.width(),
            logo_height = logo.height(),
            display_scale,
            "session ready"
        );

        let mut session = Self {
            base: Arc::new(base),
            logo: Arc::new(logo),
            margin_fraction: config.options.margin_fraction,
            output_format: config.output_format,
            compression: config.compression,
            display_scale,
            position: DEFAULT_POSITION,
            scale_fraction: DEFAULT_SCALE_FRACTION,
            opacity_fraction: DEFAULT_OPACITY_FRACTION,
            grab_offset: (0.0, 0.0),
            state: SessionState::Ready,
        };
        session.position = session.clamp_position(DEFAULT_POSITION.0, DEFAULT_POSITION.1);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Scale from source pixels to preview pixels, in (0, 1].
    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// Logo center in percent of each base dimension.
    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn scale_fraction(&self) -> f32 {
        self.scale_fraction
    }

    pub fn opacity_fraction(&self) -> f32 {
        self.opacity_fraction
    }

    /// Preview surface dimensions in pixels.
    pub fn preview_size(&self) -> (u32, u32) {
        let w = (f64::from(self.base.width()) * f64::from(self.display_scale))
            .round()
            .max(1.0) as u32;
        let h = (f64::from(self.base.height()) * f64::from(self.display_scale))
            .round()
            .max(1.0) as u32;
        (w, h)
    }

    fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Dragging)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }

    /// Convert a preview-pixel pointer coordinate into percent space.
    fn pointer_to_fraction(&self, px: f32, py: f32) -> (f32, f32) {
        (
            px / self.display_scale / self.base.width() as f32 * 100.0,
            py / self.display_scale / self.base.height() as f32 * 100.0,
        )
    }

    /// Keep the logo center within the margin band on each axis.
    fn clamp_position(&self, x: f32, y: f32) -> (f32, f32) {
        let low = (self.margin_fraction * 100.0).min(50.0);
        let high = 100.0 - low;
        (x.clamp(low, high), y.clamp(low, high))
    }

    fn scaled_logo_size(&self) -> (u32, u32) {
        placement::scaled_logo_size(
            PixelSize::new(self.logo.width(), self.logo.height()),
            self.scale_fraction,
        )
    }

    /// Begin dragging if the pointer is over the logo.
    ///
    /// Coordinates are preview pixels. Returns whether a drag started.
    pub fn pointer_down(&mut self, px: f32, py: f32) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }

        let (fx, fy) = self.pointer_to_fraction(px, py);
        let (logo_w, logo_h) = self.scaled_logo_size();
        let half_w = logo_w as f32 / self.base.width() as f32 * 50.0;
        let half_h = logo_h as f32 / self.base.height() as f32 * 50.0;

        let inside =
            (fx - self.position.0).abs() <= half_w && (fy - self.position.1).abs() <= half_h;
        if inside {
            self.grab_offset = (fx - self.position.0, fy - self.position.1);
            self.state = SessionState::Dragging;
            debug!(x = fx, y = fy, "drag started");
        }
        inside
    }

    /// Track a pointer move while dragging.
    pub fn pointer_move(&mut self, px: f32, py: f32) {
        if self.state != SessionState::Dragging {
            return;
        }
        let (fx, fy) = self.pointer_to_fraction(px, py);
        self.position = self.clamp_position(fx - self.grab_offset.0, fy - self.grab_offset.1);
    }

    /// End a drag, keeping the current position.
    pub fn pointer_up(&mut self) {
        if self.state == SessionState::Dragging {
            self.state = SessionState::Ready;
            self.grab_offset = (0.0, 0.0);
            debug!(x = self.position.0, y = self.position.1, "drag ended");
        }
    }

    /// Move the logo center directly (percent of each dimension).
    pub fn set_position(&mut self, x: f32, y: f32) {
        if self.is_open() {
            self.position = self.clamp_position(x, y);
        }
    }

    pub fn set_scale(&mut self, scale_fraction: f32) {
        if self.is_open() {
            self.scale_fraction = scale_fraction.clamp(0.01, 1.0);
        }
    }

    pub fn set_opacity(&mut self, opacity_fraction: f32) {
        if self.is_open() {
            self.opacity_fraction = opacity_fraction.clamp(0.0, 1.0);
        }
    }

    /// Restore the default position, scale and opacity.
    pub fn reset(&mut self) {
        if self.is_open() {
            self.position = self.clamp_position(DEFAULT_POSITION.0, DEFAULT_POSITION.1);
            self.scale_fraction = DEFAULT_SCALE_FRACTION;
            self.opacity_fraction = DEFAULT_OPACITY_FRACTION;
        }
    }

    /// Render the current composition at preview resolution.
    pub fn preview(&self) -> Result<RasterImage, SessionError> {
        self.ensure_open()?;

        let (pw, ph) = self.preview_size();
        let preview_base = if self.display_scale < 1.0 {
            RasterImage::from_surface(compositor::resample(self.base.surface(), pw, ph)?)
        } else {
            (*self.base).clone()
        };

        let spec = PlacementSpec::CustomFraction {
            x: self.position.0,
            y: self.position.1,
        };
        // The preview box shrinks with the display, so the logo's scale
        // fraction is multiplied by the display scale.
        let options = WatermarkOptions {
            scale_fraction: self.scale_fraction * self.display_scale,
            opacity_fraction: self.opacity_fraction,
            margin_fraction: self.margin_fraction,
        };
        let resolved = placement::resolve(
            PixelSize::new(pw, ph),
            PixelSize::new(self.logo.width(), self.logo.height()),
            &spec,
            &options,
        );

        compositor::composite(&preview_base, &self.logo, &resolved, self.opacity_fraction)
            .map_err(Into::into)
    }

    /// One atomic read of position, scale and opacity.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            position: self.position,
            scale_fraction: self.scale_fraction,
            opacity_fraction: self.opacity_fraction,
        }
    }

    /// Re-render at full source resolution and encode for export.
    ///
    /// Uses the rasters decoded at open time and a snapshot of the
    /// adjustable state, so a commit can never observe a half-applied
    /// settings change. Closes the session.
    pub async fn commit(&mut self) -> Result<Vec<u8>, SessionError> {
        self.ensure_open()?;

        let snapshot = self.snapshot();
        let base = Arc::clone(&self.base);
        let logo = Arc::clone(&self.logo);
        let margin_fraction = self.margin_fraction;
        let format = self.output_format;
        let compression = self.compression;

        let encoded = task::spawn_blocking(move || {
            let spec = PlacementSpec::CustomFraction {
                x: snapshot.position.0,
                y: snapshot.position.1,
            };
            let options = WatermarkOptions {
                scale_fraction: snapshot.scale_fraction,
                opacity_fraction: snapshot.opacity_fraction,
                margin_fraction,
            };
            let resolved = placement::resolve(
                PixelSize::new(base.width(), base.height()),
                PixelSize::new(logo.width(), logo.height()),
                &spec,
                &options,
            );
            let composited =
                compositor::composite(&base, &logo, &resolved, snapshot.opacity_fraction)?;
            let encoder = EncoderFactory::create(format);
            let output = encoder
                .encode(&composited, compression)
                .map_err(SessionError::Encode)?;
            Ok::<_, SessionError>(output.data)
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))??;

        self.state = SessionState::Committed;
        debug!(bytes = encoded.len(), "session committed");
        Ok(encoded)
    }

    /// Close without producing output; held previews are released.
    pub fn discard(&mut self) {
        if self.is_open() {
            self.state = SessionState::Discarded;
            debug!("session discarded");
        }
    }
}
