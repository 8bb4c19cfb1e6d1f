//! Export collaborator interface.
//!
//! The engine hands finished work to the outside world as named byte
//! buffers; everything past that boundary (download mechanics, archive
//! container formats) belongs to the collaborator behind [`ExportSink`].
//! [`DirectorySink`] is the filesystem collaborator the CLI uses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::raster::OutputFormat;

/// A finished output ready for delivery.
#[derive(Debug, Clone)]
pub struct NamedOutput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Errors from output delivery.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nothing to export")]
    Empty,
}

/// Destination for finished outputs.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Deliver a single output.
    async fn deliver_single(&self, output: NamedOutput) -> Result<(), ExportError>;

    /// Deliver a set of outputs under one batch name.
    async fn deliver_archive(
        &self,
        batch_name: &str,
        outputs: Vec<NamedOutput>,
    ) -> Result<(), ExportError>;
}

/// Writes outputs into a root directory; batches land in a subdirectory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn write(&self, dir: &Path, output: &NamedOutput) -> Result<(), ExportError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(&output.filename);
        fs::write(&path, &output.bytes).await?;
        info!(path = %path.display(), bytes = output.bytes.len(), "output written");
        Ok(())
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn deliver_single(&self, output: NamedOutput) -> Result<(), ExportError> {
        let root = self.root.clone();
        self.write(&root, &output).await
    }

    async fn deliver_archive(
        &self,
        batch_name: &str,
        outputs: Vec<NamedOutput>,
    ) -> Result<(), ExportError> {
        if outputs.is_empty() {
            return Err(ExportError::Empty);
        }
        let dir = self.root.join(batch_name);
        for output in &outputs {
            self.write(&dir, output).await?;
        }
        Ok(())
    }
}

/// Output filename for a processed source image.
///
/// Mirrors the delivery naming users already see in downloads:
/// `watermarked_<stem>.<ext>` with the extension of the output format.
pub fn output_filename(source_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("watermarked_{stem}.{}", format.extension())
}
