use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::panorama::capture::state::{CaptureState, CaptureStatus};
use crate::panorama::capture::timing::PipelineTimings;
use crate::panorama::capture::types::{CaptureConfig, CaptureRequest};
use crate::panorama::common::error::{CaptureError, Result};
use crate::panorama::encode::{EncodedImage, ImageEncoder, ImageFormat, StandardEncoder};
use crate::panorama::metadata::MetadataInjector;
use crate::panorama::projection::{EquirectProjector, EquirectangularBuffer, PanoramaProjector};
use crate::panorama::render::{Environment, RenderBackend, SoftwareBackend};

/// Projection, encoding and metadata injection for one render backend.
pub struct CapturePipeline<B: RenderBackend, E: ImageEncoder> {
    projector: PanoramaProjector<B>,
    encoder: Arc<E>,
    injector: Arc<MetadataInjector>,
    status: Arc<CaptureStatus>,
    config: CaptureConfig,
}

impl<Env: Environment> CapturePipeline<SoftwareBackend<Env>, StandardEncoder> {
    /// CPU pipeline rendering `environment`.
    pub fn software(environment: Env, config: CaptureConfig) -> Result<Self> {
        let backend = SoftwareBackend::new(environment, EquirectProjector::new(config.filter))?;
        let encoder = StandardEncoder::new(config.jpeg_quality);
        Ok(Self::with_custom(Arc::new(backend), encoder, config))
    }
}

impl<B: RenderBackend, E: ImageEncoder> CapturePipeline<B, E> {
    pub fn with_custom(backend: Arc<B>, encoder: E, config: CaptureConfig) -> Self {
        Self {
            projector: PanoramaProjector::new(backend, config.max_cubemap_edge),
            encoder: Arc::new(encoder),
            injector: Arc::new(MetadataInjector::new(config.xmp.clone())),
            status: Arc::new(CaptureStatus::new()),
            config,
        }
    }

    /// Cube edge for `request`, after checking it yields a non-empty panorama.
    fn validate(&self, request: &CaptureRequest) -> Result<u32> {
        let size = self.projector.cubemap_size(request.width);
        if self.config.validate_dimensions && (request.width == 0 || size < 2) {
            return Err(CaptureError::InvalidDimensions(request.width, request.width / 2));
        }
        Ok(size)
    }

    /// Blocking capture: returns the finished JPEG or PNG bytes.
    pub fn capture_sync(&self, request: &CaptureRequest) -> Result<EncodedImage> {
        self.capture_sync_with_timings(request).map(|(image, _)| image)
    }

    #[instrument(skip(self, request), fields(width = request.width, jpeg = request.encode_as_jpeg))]
    pub fn capture_sync_with_timings(
        &self,
        request: &CaptureRequest,
    ) -> Result<(EncodedImage, PipelineTimings)> {
        let cubemap_size = self.validate(request)?;
        let ticket = self.status.begin()?;
        let mut timings = PipelineTimings::new();
        info!(cubemap_size, "Starting panorama capture");

        let result = timings
            .measure("project", || {
                let _span = tracing::info_span!("project", cubemap_size).entered();
                self.projector
                    .project_sync(&request.viewpoint, cubemap_size, request.padding())
            })
            .and_then(|pixels| {
                finish_capture(
                    &pixels,
                    request.format(),
                    self.encoder.as_ref(),
                    &self.injector,
                    &mut timings,
                )
            });

        ticket.complete(result.is_ok());
        match result {
            Ok(image) => {
                info!(
                    width = image.width,
                    height = image.height,
                    bytes = image.len(),
                    "Capture complete in {:.3}ms",
                    timings.total_duration().as_secs_f64() * 1000.0
                );
                Ok((image, timings))
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
                Err(e)
            }
        }
    }

    /// Non-blocking capture. `on_complete` runs exactly once: on the backend's
    /// completion queue once the readback finished, or on the calling thread if
    /// the capture could not be started. Temporary targets are released before
    /// it runs.
    pub fn capture_async<F>(&self, request: CaptureRequest, on_complete: F)
    where
        F: FnOnce(Result<EncodedImage>) + Send + 'static,
    {
        let cubemap_size = match self.validate(&request) {
            Ok(size) => size,
            Err(e) => return on_complete(Err(e)),
        };
        let ticket = match self.status.begin() {
            Ok(ticket) => ticket,
            Err(e) => return on_complete(Err(e)),
        };
        info!(width = request.width, cubemap_size, "Starting async panorama capture");

        let targets = match self
            .projector
            .render(&request.viewpoint, cubemap_size, request.padding())
        {
            Ok(targets) => targets,
            Err(e) => {
                warn!(error = %e, "Capture failed");
                ticket.complete(false);
                return on_complete(Err(e));
            }
        };

        let encoder = Arc::clone(&self.encoder);
        let injector = Arc::clone(&self.injector);
        let format = request.format();
        targets.read_back_async(move |pixels, targets| {
            let mut timings = PipelineTimings::new();
            let result = pixels.and_then(|pixels| {
                finish_capture(&pixels, format, encoder.as_ref(), &injector, &mut timings)
            });
            drop(targets);

            ticket.complete(result.is_ok());
            match &result {
                Ok(image) => info!(bytes = image.len(), "Async capture complete"),
                Err(e) => warn!(error = %e, "Async capture failed"),
            }
            on_complete(result);
        });
    }

    pub fn state(&self) -> CaptureState {
        self.status.current()
    }

    /// Returns a finished or failed pipeline to `Idle`.
    pub fn reset(&self) {
        if self.status.current() != CaptureState::Capturing {
            self.status.reset();
        }
    }

    pub fn projector(&self) -> &PanoramaProjector<B> {
        &self.projector
    }

    pub fn injector(&self) -> &MetadataInjector {
        &self.injector
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}

/// Pixels to finished bytes; shared by the blocking and callback paths.
fn finish_capture<E: ImageEncoder + ?Sized>(
    pixels: &EquirectangularBuffer,
    format: ImageFormat,
    encoder: &E,
    injector: &MetadataInjector,
    timings: &mut PipelineTimings,
) -> Result<EncodedImage> {
    let encoded = timings.measure("encode", || {
        let _span = tracing::info_span!("encode", ?format).entered();
        encoder.encode(pixels, format)
    })?;
    timings.measure("inject", || injector.inject(&encoded))
}
