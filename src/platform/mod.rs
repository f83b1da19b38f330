//! Capability interface to the camera library.
//!
//! The coordinator only talks to these traits. A provider builds
//! capabilities, binds them to a camera for the lifetime of a
//! [`LifecycleScope`], and reports capture results asynchronously.

mod lifecycle;
mod quality;
#[cfg(feature = "simulated")]
mod simulated;
#[cfg(test)]
mod tests;

pub use lifecycle::LifecycleScope;
pub use quality::{FallbackStrategy, Quality, QualityPreference, QualitySelector};
#[cfg(feature = "simulated")]
pub use simulated::{SimulatedCamera, SimulatedStats};

use crate::error::{BindingError, CaptureError};
use crate::storage::{OutputTarget, SavedLocation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Direction a camera lens faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    Back,
    Front,
    External,
}

impl fmt::Display for LensFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LensFacing::Back => "back",
            LensFacing::Front => "front",
            LensFacing::External => "external",
        };
        f.write_str(name)
    }
}

/// Picks which physical camera capabilities are bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelector {
    pub lens_facing: LensFacing,
}

impl CameraSelector {
    pub const DEFAULT_BACK_CAMERA: CameraSelector = CameraSelector {
        lens_facing: LensFacing::Back,
    };
    pub const DEFAULT_FRONT_CAMERA: CameraSelector = CameraSelector {
        lens_facing: LensFacing::Front,
    };

    /// First camera matching this selector
    pub fn select<'a>(&self, cameras: &'a [CameraInfo]) -> Option<&'a CameraInfo> {
        cameras.iter().find(|c| c.lens_facing == self.lens_facing)
    }
}

impl fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lens_facing={}", self.lens_facing)
    }
}

/// Description of a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    pub id: String,
    pub lens_facing: LensFacing,
    pub supported_qualities: Vec<Quality>,
}

/// Live rendering surface supplied by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

impl SurfaceHandle {
    pub fn new(width: u32, height: u32) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    MinimizeLatency,
    MaximizeQuality,
}

/// Still capture settings; the default is what the app binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCaptureSettings {
    pub capture_mode: CaptureMode,
    pub jpeg_quality: u8,
}

impl Default for ImageCaptureSettings {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::MinimizeLatency,
            jpeg_quality: 95,
        }
    }
}

/// Identifies one recording across its event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(Uuid);

impl RecordingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a recording start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    pub target: OutputTarget,
    pub with_audio: bool,
}

/// Asynchronous events of a single recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    Start {
        recording: RecordingId,
    },
    Status {
        recording: RecordingId,
        recorded: Duration,
        bytes: u64,
    },
    /// Terminal event; carries the saved location or the error
    Finalize {
        recording: RecordingId,
        result: Result<SavedLocation, CaptureError>,
    },
}

impl RecordEvent {
    pub fn recording(&self) -> RecordingId {
        match self {
            RecordEvent::Start { recording }
            | RecordEvent::Status { recording, .. }
            | RecordEvent::Finalize { recording, .. } => *recording,
        }
    }
}

pub type RecordEventSender = mpsc::UnboundedSender<RecordEvent>;

/// Source of the process-wide camera provider
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Acquire the provider; completes asynchronously
    async fn acquire(&self) -> Result<Arc<dyn CameraProvider>, BindingError>;

    /// Stop the backend's internal worker at session end
    fn shutdown(&self) {}
}

/// Builds capabilities and binds them to cameras
pub trait CameraProvider: Send + Sync {
    fn available_cameras(&self) -> Vec<CameraInfo>;

    fn create_preview(&self, surface: &SurfaceHandle) -> Arc<dyn PreviewCapability>;

    fn create_image_capture(&self, settings: ImageCaptureSettings) -> Arc<dyn PhotoCapability>;

    fn create_video_capture(&self, selector: QualitySelector) -> Arc<dyn VideoCapability>;

    /// Bind the group to the camera chosen by `selector`
    fn bind(
        &self,
        scope: &LifecycleScope,
        selector: &CameraSelector,
        use_cases: UseCaseGroup,
    ) -> Result<BoundCamera, BindingError>;

    /// Release every bound capability; safe with nothing bound
    fn unbind_all(&self);

    /// Number of camera sessions currently bound
    fn bound_session_count(&self) -> usize;
}

/// Capabilities bound together in one call
#[derive(Clone)]
pub struct UseCaseGroup {
    pub preview: Arc<dyn PreviewCapability>,
    pub photo: Arc<dyn PhotoCapability>,
    pub video: Arc<dyn VideoCapability>,
}

/// Result of a successful bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCamera {
    pub camera: CameraInfo,
    pub video_quality: Quality,
}

pub trait PreviewCapability: Send + Sync {
    fn surface(&self) -> &SurfaceHandle;
}

#[async_trait]
pub trait PhotoCapability: Send + Sync {
    /// Capture one still image into `target`
    async fn take_picture(&self, target: OutputTarget) -> Result<SavedLocation, CaptureError>;
}

pub trait VideoCapability: Send + Sync {
    fn quality_selector(&self) -> &QualitySelector;

    /// Start a recording; its events are sent on `events`
    fn start_recording(
        &self,
        request: RecordingRequest,
        events: RecordEventSender,
    ) -> Result<Arc<dyn ActiveRecording>, CaptureError>;
}

/// Handle to an in-progress recording
pub trait ActiveRecording: Send + Sync {
    fn id(&self) -> RecordingId;

    fn has_audio(&self) -> bool;

    /// Request the recording to stop; Finalize follows on the event stream
    fn stop(&self);

    /// Release the handle, stopping the recording if it still runs
    fn close(&self);
}
