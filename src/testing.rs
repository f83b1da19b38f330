//! Hand-written fakes of the capability interface for unit tests.

use crate::error::{BindingError, CaptureError};
use crate::platform::{
    ActiveRecording, BoundCamera, CameraInfo, CameraProvider, CameraSelector,
    ImageCaptureSettings, LensFacing, LifecycleScope, PhotoCapability, PreviewCapability,
    ProviderSource, Quality, QualitySelector, RecordEvent, RecordEventSender, RecordingId,
    RecordingRequest, SurfaceHandle, UseCaseGroup, VideoCapability,
};
use crate::storage::{OutputTarget, SavedLocation};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn saved(uri: &str) -> SavedLocation {
    SavedLocation {
        uri: uri.to_string(),
        path: PathBuf::from(format!("/tmp/{}", uri.rsplit('/').next().unwrap_or("media"))),
    }
}

pub struct FakePhoto {
    pub result: Mutex<Result<SavedLocation, CaptureError>>,
    pub targets: Mutex<Vec<OutputTarget>>,
}

impl FakePhoto {
    pub fn succeeding() -> Self {
        Self {
            result: Mutex::new(Ok(saved("content://media/external/images/media/1"))),
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: CaptureError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.targets.lock().len()
    }
}

#[async_trait]
impl PhotoCapability for FakePhoto {
    async fn take_picture(&self, target: OutputTarget) -> Result<SavedLocation, CaptureError> {
        self.targets.lock().push(target);
        self.result.lock().clone()
    }
}

pub struct FakeRecording {
    pub id: RecordingId,
    pub with_audio: bool,
    pub stopped: AtomicBool,
    pub closed: AtomicBool,
}

impl ActiveRecording for FakeRecording {
    fn id(&self) -> RecordingId {
        self.id
    }

    fn has_audio(&self) -> bool {
        self.with_audio
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeVideo {
    pub selector: QualitySelector,
    pub fail_start: Mutex<Option<CaptureError>>,
    pub requests: Mutex<Vec<RecordingRequest>>,
    pub recordings: Mutex<Vec<Arc<FakeRecording>>>,
    events: Mutex<Option<RecordEventSender>>,
}

impl FakeVideo {
    pub fn new() -> Self {
        Self {
            selector: QualitySelector::highest_with_sd_floor(),
            fail_start: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            recordings: Mutex::new(Vec::new()),
            events: Mutex::new(None),
        }
    }

    pub fn last_recording(&self) -> Option<Arc<FakeRecording>> {
        self.recordings.lock().last().cloned()
    }

    /// Deliver an event on the stream of the latest recording
    pub fn emit(&self, event: RecordEvent) {
        if let Some(tx) = self.events.lock().as_ref() {
            let _ = tx.send(event);
        }
    }
}

impl VideoCapability for FakeVideo {
    fn quality_selector(&self) -> &QualitySelector {
        &self.selector
    }

    fn start_recording(
        &self,
        request: RecordingRequest,
        events: RecordEventSender,
    ) -> Result<Arc<dyn ActiveRecording>, CaptureError> {
        if let Some(e) = self.fail_start.lock().clone() {
            return Err(e);
        }

        let recording = Arc::new(FakeRecording {
            id: RecordingId::new(),
            with_audio: request.with_audio,
            stopped: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });
        self.requests.lock().push(request);
        self.recordings.lock().push(Arc::clone(&recording));
        *self.events.lock() = Some(events);
        Ok(recording)
    }
}

pub struct FakePreview {
    surface: SurfaceHandle,
}

impl PreviewCapability for FakePreview {
    fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }
}

/// Provider counting bound sessions instead of driving a camera
pub struct FakeProvider {
    pub cameras: Vec<CameraInfo>,
    pub fail_bind: Mutex<Option<BindingError>>,
    pub sessions: AtomicUsize,
    pub binds: AtomicUsize,
    pub unbind_calls: AtomicUsize,
    pub photos: Mutex<Vec<Arc<FakePhoto>>>,
    pub videos: Mutex<Vec<Arc<FakeVideo>>>,
}

impl FakeProvider {
    pub fn with_back_camera() -> Self {
        Self::with_cameras(vec![CameraInfo {
            id: "0".to_string(),
            lens_facing: LensFacing::Back,
            supported_qualities: vec![Quality::Sd, Quality::Hd],
        }])
    }

    pub fn with_cameras(cameras: Vec<CameraInfo>) -> Self {
        Self {
            cameras,
            fail_bind: Mutex::new(None),
            sessions: AtomicUsize::new(0),
            binds: AtomicUsize::new(0),
            unbind_calls: AtomicUsize::new(0),
            photos: Mutex::new(Vec::new()),
            videos: Mutex::new(Vec::new()),
        }
    }

    pub fn last_photo(&self) -> Option<Arc<FakePhoto>> {
        self.photos.lock().last().cloned()
    }

    pub fn last_video(&self) -> Option<Arc<FakeVideo>> {
        self.videos.lock().last().cloned()
    }
}

impl CameraProvider for FakeProvider {
    fn available_cameras(&self) -> Vec<CameraInfo> {
        self.cameras.clone()
    }

    fn create_preview(&self, surface: &SurfaceHandle) -> Arc<dyn PreviewCapability> {
        Arc::new(FakePreview {
            surface: surface.clone(),
        })
    }

    fn create_image_capture(&self, _settings: ImageCaptureSettings) -> Arc<dyn PhotoCapability> {
        let photo = Arc::new(FakePhoto::succeeding());
        self.photos.lock().push(Arc::clone(&photo));
        photo
    }

    fn create_video_capture(&self, selector: QualitySelector) -> Arc<dyn VideoCapability> {
        let mut video = FakeVideo::new();
        video.selector = selector;
        let video = Arc::new(video);
        self.videos.lock().push(Arc::clone(&video));
        video
    }

    fn bind(
        &self,
        scope: &LifecycleScope,
        selector: &CameraSelector,
        use_cases: UseCaseGroup,
    ) -> Result<BoundCamera, BindingError> {
        if let Some(e) = self.fail_bind.lock().clone() {
            return Err(e);
        }
        if !scope.is_active() {
            return Err(BindingError::BindFailed {
                details: "scope ended".to_string(),
            });
        }

        let camera = selector
            .select(&self.cameras)
            .cloned()
            .ok_or_else(|| BindingError::NoMatchingCamera {
                selector: selector.to_string(),
            })?;
        let video_quality = use_cases
            .video
            .quality_selector()
            .resolve(&camera.supported_qualities)
            .ok_or_else(|| BindingError::NoSupportedQuality {
                selector: selector.to_string(),
            })?;

        self.sessions.fetch_add(1, Ordering::SeqCst);
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(BoundCamera {
            camera,
            video_quality,
        })
    }

    fn unbind_all(&self) {
        self.unbind_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions.store(0, Ordering::SeqCst);
    }

    fn bound_session_count(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

pub struct FakeProviderSource {
    pub provider: Arc<FakeProvider>,
    pub acquisitions: AtomicUsize,
    pub shutdowns: AtomicUsize,
    pub fail: Mutex<Option<BindingError>>,
}

impl FakeProviderSource {
    pub fn new(provider: Arc<FakeProvider>) -> Self {
        Self {
            provider,
            acquisitions: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            fail: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProviderSource for FakeProviderSource {
    async fn acquire(&self) -> Result<Arc<dyn CameraProvider>, BindingError> {
        if let Some(e) = self.fail.lock().clone() {
            return Err(e);
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.provider) as Arc<dyn CameraProvider>)
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
