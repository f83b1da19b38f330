use super::{
    ActiveRecording, BoundCamera, CameraInfo, CameraProvider, CameraSelector,
    ImageCaptureSettings, LifecycleScope, PhotoCapability, PreviewCapability, ProviderSource,
    Quality, QualitySelector, RecordEvent, RecordEventSender, RecordingId, RecordingRequest,
    SurfaceHandle, UseCaseGroup, VideoCapability,
};
use crate::config::{CameraConfig, MAX_FRAME_RATE};
use crate::error::{BindingError, CaptureError};
use crate::storage::{FileMediaStore, OutputTarget, SavedLocation};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Binding state shared between the provider and one capability
#[derive(Default)]
struct BindSlot {
    token: Option<CancellationToken>,
    quality: Option<Quality>,
}

impl BindSlot {
    fn active(&self) -> Option<CancellationToken> {
        self.token.as_ref().filter(|t| !t.is_cancelled()).cloned()
    }
}

type SharedSlot = Arc<Mutex<BindSlot>>;

/// Jobs handled by the backend's single worker
enum WorkerJob {
    Write {
        target: OutputTarget,
        contents: Vec<u8>,
        reply: oneshot::Sender<Result<SavedLocation, CaptureError>>,
    },
}

struct BoundSession {
    token: CancellationToken,
    camera_id: String,
}

/// Counters exposed for diagnostics and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedStats {
    pub acquisitions: u64,
    pub binds: u64,
    pub unbinds: u64,
    pub photos_taken: u64,
    pub recordings_started: u64,
    pub last_recording_audio: Option<bool>,
}

struct Inner {
    config: CameraConfig,
    store: Arc<FileMediaStore>,
    cameras: Vec<CameraInfo>,
    worker_tx: Mutex<Option<mpsc::UnboundedSender<WorkerJob>>>,
    slots: Mutex<HashMap<usize, Weak<Mutex<BindSlot>>>>,
    sessions: Mutex<Vec<BoundSession>>,
    recording_active: AtomicBool,
    stats: Mutex<SimulatedStats>,
}

/// Camera backend that renders test patterns instead of talking to hardware
///
/// Photos are real JPEG files. Recordings write a small placeholder stream
/// describing the frames produced while the recording ran.
#[derive(Clone)]
pub struct SimulatedCamera {
    inner: Arc<Inner>,
}

impl SimulatedCamera {
    pub fn new(config: CameraConfig, store: Arc<FileMediaStore>) -> Self {
        let cameras = config
            .lenses
            .iter()
            .enumerate()
            .map(|(i, lens)| CameraInfo {
                id: i.to_string(),
                lens_facing: *lens,
                supported_qualities: config.supported_qualities.clone(),
            })
            .collect();

        Self {
            inner: Arc::new(Inner {
                config,
                store,
                cameras,
                worker_tx: Mutex::new(None),
                slots: Mutex::new(HashMap::new()),
                sessions: Mutex::new(Vec::new()),
                recording_active: AtomicBool::new(false),
                stats: Mutex::new(SimulatedStats::default()),
            }),
        }
    }

    pub fn stats(&self) -> SimulatedStats {
        self.inner.stats.lock().clone()
    }

    pub fn worker_running(&self) -> bool {
        self.inner.worker_tx.lock().is_some()
    }

    fn ensure_worker(&self) {
        let mut worker_tx = self.inner.worker_tx.lock();
        if worker_tx.is_some() {
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let store = Arc::clone(&self.inner.store);
        tokio::spawn(async move {
            camera_worker(rx, store).await;
        });
        *worker_tx = Some(tx);
    }

    /// Remember a capability's slot so `bind` can find it again
    fn track(&self, key: usize, slot: &SharedSlot) {
        let mut slots = self.inner.slots.lock();
        slots.retain(|_, weak| weak.strong_count() > 0);
        slots.insert(key, Arc::downgrade(slot));
    }

    fn slot_for(&self, key: usize) -> Option<SharedSlot> {
        self.inner.slots.lock().get(&key).and_then(Weak::upgrade)
    }
}

fn arc_key<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as *const () as usize
}

impl Inner {
    async fn submit(
        &self,
        target: OutputTarget,
        contents: Vec<u8>,
    ) -> Result<SavedLocation, CaptureError> {
        let worker_tx = self
            .worker_tx
            .lock()
            .clone()
            .ok_or(CaptureError::CameraClosed)?;

        let (reply, response) = oneshot::channel();
        worker_tx
            .send(WorkerJob::Write {
                target,
                contents,
                reply,
            })
            .map_err(|_| CaptureError::CameraClosed)?;

        response.await.map_err(|_| CaptureError::CameraClosed)?
    }
}

/// Background worker that writes finished media into the store
async fn camera_worker(mut jobs: mpsc::UnboundedReceiver<WorkerJob>, store: Arc<FileMediaStore>) {
    info!("Camera worker started");

    while let Some(job) = jobs.recv().await {
        match job {
            WorkerJob::Write {
                target,
                contents,
                reply,
            } => {
                let result = store.write(&target, &contents).await;
                if let Err(e) = &result {
                    error!("Failed to store {}: {}", target.display_name, e);
                }
                let _ = reply.send(result);
            }
        }
    }

    info!("Camera worker stopped");
}

#[async_trait]
impl ProviderSource for SimulatedCamera {
    async fn acquire(&self) -> Result<Arc<dyn CameraProvider>, BindingError> {
        tokio::task::yield_now().await;
        self.ensure_worker();
        self.inner.stats.lock().acquisitions += 1;
        debug!("Simulated camera provider acquired");
        Ok(Arc::new(self.clone()))
    }

    fn shutdown(&self) {
        self.unbind_all();
        if self.inner.worker_tx.lock().take().is_some() {
            info!("Camera worker shutting down");
        }
    }
}

impl CameraProvider for SimulatedCamera {
    fn available_cameras(&self) -> Vec<CameraInfo> {
        self.inner.cameras.clone()
    }

    fn create_preview(&self, surface: &SurfaceHandle) -> Arc<dyn PreviewCapability> {
        let slot: SharedSlot = Arc::new(Mutex::new(BindSlot::default()));
        let preview = Arc::new(SimPreview {
            surface: surface.clone(),
            _slot: Arc::clone(&slot),
        });
        self.track(arc_key(&preview), &slot);
        preview
    }

    fn create_image_capture(&self, settings: ImageCaptureSettings) -> Arc<dyn PhotoCapability> {
        let slot: SharedSlot = Arc::new(Mutex::new(BindSlot::default()));
        let photo = Arc::new(SimPhoto {
            camera: self.clone(),
            settings,
            slot: Arc::clone(&slot),
        });
        self.track(arc_key(&photo), &slot);
        photo
    }

    fn create_video_capture(&self, selector: QualitySelector) -> Arc<dyn VideoCapability> {
        let slot: SharedSlot = Arc::new(Mutex::new(BindSlot::default()));
        let video = Arc::new(SimVideo {
            camera: self.clone(),
            selector,
            slot: Arc::clone(&slot),
        });
        self.track(arc_key(&video), &slot);
        video
    }

    fn bind(
        &self,
        scope: &LifecycleScope,
        selector: &CameraSelector,
        use_cases: UseCaseGroup,
    ) -> Result<BoundCamera, BindingError> {
        if self.inner.config.fail_binding {
            return Err(BindingError::BindFailed {
                details: "camera is in use by another client".to_string(),
            });
        }

        if !scope.is_active() {
            return Err(BindingError::BindFailed {
                details: format!("lifecycle scope '{}' has ended", scope.name()),
            });
        }

        let camera = selector
            .select(&self.inner.cameras)
            .cloned()
            .ok_or_else(|| BindingError::NoMatchingCamera {
                selector: selector.to_string(),
            })?;

        let quality = use_cases
            .video
            .quality_selector()
            .resolve(&camera.supported_qualities)
            .ok_or_else(|| BindingError::NoSupportedQuality {
                selector: selector.to_string(),
            })?;

        let slots = [
            self.slot_for(arc_key(&use_cases.preview)),
            self.slot_for(arc_key(&use_cases.photo)),
            self.slot_for(arc_key(&use_cases.video)),
        ];
        if slots.iter().any(Option::is_none) {
            return Err(BindingError::BindFailed {
                details: "use case was not created by this provider".to_string(),
            });
        }

        let token = CancellationToken::new();
        for slot in slots.into_iter().flatten() {
            let mut slot = slot.lock();
            slot.token = Some(token.clone());
            slot.quality = Some(quality);
        }

        self.inner.sessions.lock().push(BoundSession {
            token,
            camera_id: camera.id.clone(),
        });
        self.inner.stats.lock().binds += 1;

        info!(
            "Bound preview, photo and video to camera {} ({}) at {}",
            camera.id, camera.lens_facing, quality
        );

        Ok(BoundCamera {
            camera,
            video_quality: quality,
        })
    }

    fn unbind_all(&self) {
        let sessions = std::mem::take(&mut *self.inner.sessions.lock());
        if sessions.is_empty() {
            debug!("Unbind requested with nothing bound");
            return;
        }

        for session in sessions {
            debug!("Unbinding camera {}", session.camera_id);
            session.token.cancel();
        }
        self.inner.stats.lock().unbinds += 1;
    }

    fn bound_session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }
}

struct SimPreview {
    surface: SurfaceHandle,
    // Holds the bind slot alive for as long as the preview exists
    _slot: SharedSlot,
}

impl PreviewCapability for SimPreview {
    fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }
}

struct SimPhoto {
    camera: SimulatedCamera,
    settings: ImageCaptureSettings,
    slot: SharedSlot,
}

#[async_trait]
impl PhotoCapability for SimPhoto {
    async fn take_picture(&self, target: OutputTarget) -> Result<SavedLocation, CaptureError> {
        if self.slot.lock().active().is_none() {
            return Err(CaptureError::NotBound);
        }

        let inner = &self.camera.inner;
        if inner.config.fail_photo {
            return Err(CaptureError::Encoding {
                details: "sensor returned no frame".to_string(),
            });
        }

        let (width, height) = inner.config.photo_resolution;
        let quality = self.settings.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || encode_test_pattern(width, height, quality))
            .await
            .map_err(|e| CaptureError::Encoding {
                details: e.to_string(),
            })??;

        let location = inner.submit(target, jpeg).await?;
        inner.stats.lock().photos_taken += 1;
        Ok(location)
    }
}

/// Colour bars with a diagonal gradient
fn encode_test_pattern(width: u32, height: u32, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let bars: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];
    let bar_width = (width / bars.len() as u32).max(1);

    let image = RgbImage::from_fn(width, height, |x, y| {
        let bar = bars[((x / bar_width) as usize).min(bars.len() - 1)];
        let shade = ((x + y) % 64) as u8;
        Rgb([
            bar[0].saturating_add(shade),
            bar[1].saturating_add(shade),
            bar[2].saturating_add(shade),
        ])
    });

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(image.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|e| CaptureError::Encoding {
            details: e.to_string(),
        })?;
    Ok(jpeg)
}

struct SimVideo {
    camera: SimulatedCamera,
    selector: QualitySelector,
    slot: SharedSlot,
}

impl VideoCapability for SimVideo {
    fn quality_selector(&self) -> &QualitySelector {
        &self.selector
    }

    fn start_recording(
        &self,
        request: RecordingRequest,
        events: RecordEventSender,
    ) -> Result<Arc<dyn ActiveRecording>, CaptureError> {
        let (bind_token, quality) = {
            let slot = self.slot.lock();
            match (slot.active(), slot.quality) {
                (Some(token), Some(quality)) => (token, quality),
                _ => return Err(CaptureError::NotBound),
            }
        };

        let inner = Arc::clone(&self.camera.inner);
        if inner.recording_active.swap(true, Ordering::AcqRel) {
            return Err(CaptureError::RecordingActive);
        }

        let recording = Arc::new(SimRecording {
            id: RecordingId::new(),
            with_audio: request.with_audio,
            stop: CancellationToken::new(),
            closed: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        });

        {
            let mut stats = inner.stats.lock();
            stats.recordings_started += 1;
            stats.last_recording_audio = Some(request.with_audio);
        }

        info!(
            "Recording {} started at {} (audio: {})",
            recording.id, quality, request.with_audio
        );

        let task_recording = Arc::clone(&recording);
        tokio::spawn(async move {
            run_recording(inner, task_recording, request, quality, bind_token, events).await;
        });

        Ok(recording)
    }
}

async fn run_recording(
    inner: Arc<Inner>,
    recording: Arc<SimRecording>,
    request: RecordingRequest,
    quality: Quality,
    bind_token: CancellationToken,
    events: RecordEventSender,
) {
    let id = recording.id;
    let fps = inner.config.frame_rate.clamp(1, MAX_FRAME_RATE);
    let _ = events.send(RecordEvent::Start { recording: id });

    let mut ticker = tokio::time::interval(Duration::from_secs(1) / fps);
    let outcome = loop {
        tokio::select! {
            _ = recording.stop.cancelled() => break Ok(()),
            _ = bind_token.cancelled() => break Err(CaptureError::SourceInactive),
            _ = ticker.tick() => {
                let frames = recording.frames.fetch_add(1, Ordering::Relaxed) + 1;
                if frames % fps as u64 == 0 {
                    let _ = events.send(RecordEvent::Status {
                        recording: id,
                        recorded: Duration::from_secs(frames / fps as u64),
                        bytes: frames * frame_size(quality),
                    });
                }
            }
        }
    };

    let frames = recording.frames.load(Ordering::Relaxed);
    let result = match outcome {
        Ok(()) => {
            let contents = placeholder_stream(quality, fps, frames, request.with_audio);
            inner.submit(request.target, contents).await
        }
        Err(e) => {
            warn!("Recording {} interrupted: {}", id, e);
            Err(e)
        }
    };

    inner.recording_active.store(false, Ordering::Release);
    let _ = events.send(RecordEvent::Finalize {
        recording: id,
        result,
    });
}

/// Nominal encoded bytes per frame
fn frame_size(quality: Quality) -> u64 {
    let (w, h) = quality.resolution();
    (w as u64 * h as u64) / 20
}

fn placeholder_stream(quality: Quality, fps: u32, frames: u64, with_audio: bool) -> Vec<u8> {
    let (w, h) = quality.resolution();
    format!(
        "CAMAPP-SIMULATED-VIDEO\nquality={}\nresolution={}x{}\nfps={}\nframes={}\naudio={}\n",
        quality, w, h, fps, frames, with_audio
    )
    .into_bytes()
}

struct SimRecording {
    id: RecordingId,
    with_audio: bool,
    stop: CancellationToken,
    closed: AtomicBool,
    frames: AtomicU64,
}

impl ActiveRecording for SimRecording {
    fn id(&self) -> RecordingId {
        self.id
    }

    fn has_audio(&self) -> bool {
        self.with_audio
    }

    fn stop(&self) {
        debug!("Stop requested for recording {}", self.id);
        self.stop.cancel();
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.stop.cancel();
            debug!("Recording {} closed", self.id);
        }
    }
}
