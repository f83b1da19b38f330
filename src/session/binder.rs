use crate::error::BindingError;
use crate::permissions::PermissionGate;
use crate::platform::{
    BoundCamera, CameraProvider, CameraSelector, ImageCaptureSettings, LifecycleScope,
    ProviderSource, QualitySelector, SurfaceHandle, UseCaseGroup,
};
use crate::state::CaptureState;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

const UNBIND_TEARDOWN: &str = "camera-unbind";

/// Builds preview, photo and video capabilities and binds them to the camera
pub struct SessionBinder {
    source: Arc<dyn ProviderSource>,
    gate: Arc<PermissionGate>,
    scope: Arc<LifecycleScope>,
    selector: CameraSelector,
    surface: RwLock<Option<SurfaceHandle>>,
    provider: RwLock<Option<Arc<dyn CameraProvider>>>,
    attempts: AtomicU64,
}

impl SessionBinder {
    pub fn new(
        source: Arc<dyn ProviderSource>,
        gate: Arc<PermissionGate>,
        scope: Arc<LifecycleScope>,
    ) -> Self {
        Self {
            source,
            gate,
            scope,
            selector: CameraSelector::DEFAULT_BACK_CAMERA,
            surface: RwLock::new(None),
            provider: RwLock::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn set_surface(&self, surface: SurfaceHandle) {
        debug!(
            "Rendering surface {} available ({}x{})",
            surface.id, surface.width, surface.height
        );
        *self.surface.write() = Some(surface);
    }

    pub fn has_surface(&self) -> bool {
        self.surface.read().is_some()
    }

    /// Provider acquired by the last start, if any
    pub fn provider(&self) -> Option<Arc<dyn CameraProvider>> {
        self.provider.read().clone()
    }

    /// Number of times `start_camera` ran past its preconditions
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Unbind, then bind a fresh preview/photo/video set to the back camera.
    ///
    /// Capture state is only written after the bind succeeds; on failure it
    /// keeps whatever it held before the call.
    pub async fn start_camera(&self, state: &CaptureState) -> Result<BoundCamera, BindingError> {
        let surface = self.surface.read().clone().ok_or(BindingError::NoSurface)?;
        if !self.gate.camera_granted() {
            return Err(BindingError::CameraPermissionMissing);
        }

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Starting camera (attempt {})", attempt);

        let provider = self.source.acquire().await.map_err(|e| {
            error!("Camera provider acquisition failed: {}", e);
            e
        })?;
        *self.provider.write() = Some(Arc::clone(&provider));

        let preview = provider.create_preview(&surface);
        let video = provider.create_video_capture(QualitySelector::highest_with_sd_floor());
        let photo = provider.create_image_capture(ImageCaptureSettings::default());

        provider.unbind_all();

        let use_cases = UseCaseGroup {
            preview,
            photo: Arc::clone(&photo),
            video: Arc::clone(&video),
        };

        match provider.bind(&self.scope, &self.selector, use_cases) {
            Ok(bound) => {
                let unbind_provider = Arc::clone(&provider);
                self.scope.on_end(UNBIND_TEARDOWN, move || {
                    info!("Lifecycle ended, unbinding camera");
                    unbind_provider.unbind_all();
                });

                state.set_capabilities(Some(photo), Some(video));
                info!(
                    "Use cases bound to camera {} with video quality {}",
                    bound.camera.id, bound.video_quality
                );
                Ok(bound)
            }
            Err(e) => {
                error!("Use case binding failed: {}", e);
                Err(e)
            }
        }
    }

    /// Release every bound capability
    pub fn unbind(&self) {
        if let Some(provider) = self.provider.read().as_ref() {
            provider.unbind_all();
        }
    }
}
