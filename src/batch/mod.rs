//! Sequential batch compositing.
//!
//! Runs the full decode → resolve → composite → encode pipeline over a
//! list of images against one shared logo and one placement snapshot.
//! Images are processed strictly one at a time, so peak memory stays at
//! roughly one decoded frame plus the shared logo.
//!
//! Results are emitted as a lazy, finite, non-restartable event stream;
//! a failed image is reported in its event and never aborts the rest of
//! the batch.
//!
//! # Example
//!
//! ```ignore
//! use selo::batch::{BatchItem, BatchJob, BatchRunner};
//!
//! let runner = BatchRunner::new(job);
//! let cancel = runner.cancel_handle();
//! let mut events = runner.run(items);
//! while let Some(event) = events.recv().await {
//!     // per-image outcome plus fractional progress
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};

use crate::assets::{AssetId, ProcessedOutput, WatermarkOptions};
use crate::compositor;
use crate::error::EngineError;
use crate::export::output_filename;
use crate::placement::{self, PixelSize, PlacementSpec};
use crate::raster::{self, CompressionLevel, EncoderFactory, OutputFormat, RasterImage};

/// One image queued for processing.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: AssetId,
    pub name: String,
    pub bytes: Bytes,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            id: AssetId::new(),
            name: name.into(),
            bytes,
        }
    }
}

/// Everything a run needs, snapshotted up front.
///
/// The logo raster is shared read-only across all images of the batch.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub logo: Arc<RasterImage>,
    pub placement: PlacementSpec,
    pub options: WatermarkOptions,
    pub format: OutputFormat,
    pub compression: CompressionLevel,
}

/// Per-image result event.
#[derive(Debug)]
pub struct BatchEvent {
    pub image_id: AssetId,
    pub name: String,
    /// Zero-based position of this image in the batch
    pub index: usize,
    pub total: usize,
    /// Fraction of the batch finished once this event is observed
    pub progress: f32,
    pub outcome: Result<ProcessedOutput, EngineError>,
}

/// Handle for best-effort cancellation between images.
#[derive(Debug, Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sequential batch compositor.
pub struct BatchRunner {
    job: BatchJob,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(job: BatchJob) -> Self {
        Self {
            job,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that cancels the run before the next image starts.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    /// Consume the runner and process the items in order.
    ///
    /// Returns the receiving end of the event stream. Each image is fully
    /// processed before the next one starts; dropping the receiver stops
    /// the run after the in-flight image.
    pub fn run(self, items: Vec<BatchItem>) -> mpsc::Receiver<BatchEvent> {
        let (tx, rx) = mpsc::channel(1);
        let BatchRunner { job, cancel } = self;

        tokio::spawn(async move {
            let total = items.len();
            info!(total, "starting batch run");

            for (index, item) in items.into_iter().enumerate() {
                if cancel.load(Ordering::SeqCst) {
                    info!(completed = index, remaining = total - index, "batch cancelled");
                    break;
                }

                let BatchItem { id, name, bytes } = item;
                let stage_job = job.clone();
                let stage_name = name.clone();

                let outcome =
                    match task::spawn_blocking(move || watermark_image(&stage_job, &stage_name, &bytes))
                        .await
                    {
                        Ok(result) => result,
                        Err(e) => Err(EngineError::Internal(format!(
                            "pipeline task failed: {e}"
                        ))),
                    };

                match &outcome {
                    Ok(output) => debug!(
                        image = %name,
                        output_bytes = output.bytes.len(),
                        width = output.width,
                        height = output.height,
                        "image processed"
                    ),
                    Err(error) => warn!(image = %name, %error, "image failed; continuing batch"),
                }

                let event = BatchEvent {
                    image_id: id,
                    name,
                    index,
                    total,
                    progress: (index + 1) as f32 / total as f32,
                    outcome,
                };

                if tx.send(event).await.is_err() {
                    debug!("event receiver dropped; stopping batch");
                    break;
                }
            }
        });

        rx
    }
}

/// Run the full single-image pipeline: decode, resolve, composite, encode.
pub fn watermark_image(
    job: &BatchJob,
    name: &str,
    bytes: &[u8],
) -> Result<ProcessedOutput, EngineError> {
    let base = raster::decode(bytes)?;

    let placement = placement::resolve(
        PixelSize::new(base.width(), base.height()),
        PixelSize::new(job.logo.width(), job.logo.height()),
        &job.placement,
        &job.options,
    );

    let composited = compositor::composite(&base, &job.logo, &placement, job.options.opacity_fraction)?;

    let encoder = EncoderFactory::create(job.format);
    let encoded = encoder.encode(&composited, job.compression)?;

    Ok(ProcessedOutput {
        filename: output_filename(name, job.format),
        format: job.format,
        width: composited.width(),
        height: composited.height(),
        bytes: encoded.data,
    })
}
