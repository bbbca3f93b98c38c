use std::path::PathBuf;

use anyhow::Context;
use spaces_pano_rs::logger;
use spaces_pano_rs::panorama::{
    CaptureConfig, CapturePipeline, CaptureRequest, ImageFormat, SampleFilter, SkyGradient,
    Viewpoint,
};

use glam::Vec3;
use tracing::{error, info};

/// `spaces-pano [jpeg-out] [png-out] [width] [heading-degrees]`
fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let default_path = |format: ImageFormat| format!("panorama.{}", format.extension());
    let jpeg_path = PathBuf::from(args.next().unwrap_or_else(|| default_path(ImageFormat::Jpeg)));
    let png_path = PathBuf::from(args.next().unwrap_or_else(|| default_path(ImageFormat::Png)));
    let width: u32 = match args.next() {
        Some(w) => w.parse().with_context(|| format!("invalid width {w:?}"))?,
        None => 2048,
    };
    let heading: f32 = match args.next() {
        Some(h) => h.parse().with_context(|| format!("invalid heading {h:?}"))?,
        None => 0.0,
    };

    info!("Starting spaces-pano...");

    let config = CaptureConfig::builder()
        .filter(SampleFilter::Bilinear)
        .jpeg_quality(100)
        .build();
    let pipeline = CapturePipeline::software(SkyGradient::default(), config)?;

    info!("Capture pipeline initialized");
    info!("Max cubemap edge: {}", pipeline.config().max_cubemap_edge);

    let request = CaptureRequest::new(width)
        .face_alignment(true)
        .heading(heading)
        .viewpoint(Viewpoint::at(Vec3::new(0.0, 1.7, 0.0)));

    for (path, jpeg) in [(&jpeg_path, true), (&png_path, false)] {
        match pipeline.capture_sync_with_timings(&request.jpeg(jpeg)) {
            Ok((image, timings)) => {
                timings.log_summary();
                std::fs::write(path, &image.bytes)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(
                    "Wrote {} ({}x{}, {} bytes)",
                    path.display(),
                    image.width,
                    image.height,
                    image.len()
                );
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                return Err(e.into());
            }
        }
    }

    Ok(())
}
