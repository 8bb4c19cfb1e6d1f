use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::Parser;

use selo::assets::AssetStore;
use selo::batch::{BatchItem, BatchJob, BatchRunner};
use selo::config::JobConfig;
use selo::export::{DirectorySink, ExportSink, NamedOutput};
use selo::logging::LogFormat;
use selo::placement::{Corner, PlacementSpec};

/// Selo - composite a logo onto a batch of images
#[derive(Parser, Debug)]
#[command(name = "selo")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a YAML job configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Logo image composited onto every input
    #[arg(short, long)]
    logo: PathBuf,

    /// Input images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "watermarked")]
    out: PathBuf,

    /// Anchor corner override (top-left, top-right, bottom-left, bottom-right)
    #[arg(long)]
    corner: Option<String>,

    /// Logo scale override, fraction of the logo's natural size in (0, 1]
    #[arg(long)]
    scale: Option<f32>,

    /// Logo opacity override in [0, 1]
    #[arg(long)]
    opacity: Option<f32>,

    /// Edge margin override, fraction of the shorter image side in [0, 1)
    #[arg(long)]
    margin: Option<f32>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_corner(value: &str) -> anyhow::Result<Corner> {
    match value {
        "top-left" => Ok(Corner::TopLeft),
        "top-right" => Ok(Corner::TopRight),
        "bottom-left" => Ok(Corner::BottomLeft),
        "bottom-right" => Ok(Corner::BottomRight),
        other => bail!(
            "unknown corner '{other}'; expected one of top-left, top-right, bottom-left, bottom-right"
        ),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string()
}

/// Fold CLI overrides into the loaded configuration.
fn apply_overrides(config: &mut JobConfig, args: &Args) -> anyhow::Result<()> {
    if let Some(corner) = &args.corner {
        let corner = parse_corner(corner)?;
        let margin_fraction = match config.placement {
            PlacementSpec::Anchored {
                margin_fraction, ..
            } => margin_fraction,
            _ => config.options.margin_fraction,
        };
        config.placement = PlacementSpec::Anchored {
            corner,
            margin_fraction,
        };
    }
    if let Some(scale) = args.scale {
        config.options.scale_fraction = scale;
    }
    if let Some(opacity) = args.opacity {
        config.options.opacity_fraction = opacity;
    }
    if let Some(margin) = args.margin {
        config.options.margin_fraction = margin;
        if let PlacementSpec::Anchored { corner, .. } = config.placement {
            config.placement = PlacementSpec::Anchored {
                corner,
                margin_fraction: margin,
            };
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging subsystem
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    selo::logging::init_with_format(format)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging subsystem: {e}"))?;

    // Load job configuration
    let mut config = match &args.config {
        Some(path) => JobConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => JobConfig::default(),
    };
    apply_overrides(&mut config, &args)?;
    config.validate().context("invalid job configuration")?;

    tracing::info!(
        logo = %args.logo.display(),
        images = args.images.len(),
        out = %args.out.display(),
        placement = ?config.placement,
        scale = config.options.scale_fraction,
        opacity = config.options.opacity_fraction,
        "configuration loaded successfully"
    );

    // Register the logo and every input image with the asset store
    let mut store = AssetStore::new();

    let logo_bytes = tokio::fs::read(&args.logo)
        .await
        .with_context(|| format!("failed to read logo {}", args.logo.display()))?;
    let logo_id = store
        .add_logo(file_name(&args.logo), logo_bytes.into())
        .context("failed to decode logo")?;
    store.select_logo(logo_id)?;

    let mut items = Vec::with_capacity(args.images.len());
    let mut rejected = 0usize;
    for path in &args.images {
        let bytes: Bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image {}", path.display()))?
            .into();
        let name = file_name(path);
        match store.add_image(name.clone(), bytes.clone()) {
            Ok(id) => items.push(BatchItem { id, name, bytes }),
            Err(error) => {
                rejected += 1;
                tracing::warn!(image = %name, %error, "skipping undecodable input");
            }
        }
    }

    let logo = store
        .selected_logo()
        .map(|asset| Arc::clone(&asset.raster))
        .context("no logo selected")?;

    let job = BatchJob {
        logo,
        placement: config.placement,
        options: config.options,
        format: config.output_format,
        compression: config.compression,
    };

    // Run the batch and collect successful outputs
    let runner = BatchRunner::new(job);
    let mut events = runner.run(items);

    let mut outputs = Vec::new();
    let mut failed = 0usize;
    while let Some(event) = events.recv().await {
        match event.outcome {
            Ok(output) => {
                tracing::info!(
                    image = %event.name,
                    output = %output.filename,
                    progress = event.progress,
                    "image processed"
                );
                outputs.push(NamedOutput {
                    filename: output.filename.clone(),
                    bytes: output.bytes.clone(),
                });
                store.record_processed(event.image_id, output);
            }
            Err(error) => {
                failed += 1;
                tracing::warn!(image = %event.name, %error, progress = event.progress, "image failed");
            }
        }
    }

    tracing::info!(
        processed = outputs.len(),
        failed = failed + rejected,
        "batch finished"
    );

    // Hand the finished outputs to the filesystem collaborator
    let sink = DirectorySink::new(&args.out);
    match outputs.len() {
        0 => bail!("no images were processed successfully"),
        1 => {
            let single = outputs.remove(0);
            sink.deliver_single(single).await?;
        }
        _ => sink.deliver_archive("watermarked_images", outputs).await?,
    }

    Ok(())
}
