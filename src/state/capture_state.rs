use super::observable::{Observable, SubscriptionId};
use crate::platform::{ActiveRecording, PhotoCapability, RecordingId, VideoCapability};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Where the current recording is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    Idle,
    /// Start requested, start event not received yet
    Requested,
    Started,
    /// Stop requested, finalize event not received yet
    Finalizing,
}

/// Snapshot of camera readiness handed to observers
#[derive(Clone, Default)]
pub struct CaptureSnapshot {
    pub photo_capability: Option<Arc<dyn PhotoCapability>>,
    pub video_capability: Option<Arc<dyn VideoCapability>>,
    pub active_recording: Option<Arc<dyn ActiveRecording>>,
    pub is_recording: bool,
}

impl CaptureSnapshot {
    pub fn photo_ready(&self) -> bool {
        self.photo_capability.is_some()
    }

    pub fn video_ready(&self) -> bool {
        self.video_capability.is_some()
    }

    pub fn active_recording_id(&self) -> Option<RecordingId> {
        self.active_recording.as_ref().map(|r| r.id())
    }

    pub fn phase(&self) -> RecordingPhase {
        match (self.active_recording.is_some(), self.is_recording) {
            (false, false) => RecordingPhase::Idle,
            (true, false) => RecordingPhase::Requested,
            (true, true) => RecordingPhase::Started,
            (false, true) => RecordingPhase::Finalizing,
        }
    }
}

impl fmt::Debug for CaptureSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSnapshot")
            .field("photo_ready", &self.photo_ready())
            .field("video_ready", &self.video_ready())
            .field("active_recording", &self.active_recording_id())
            .field("is_recording", &self.is_recording)
            .finish()
    }
}

/// The single mutable record of camera readiness for one UI session
pub struct CaptureState {
    inner: Observable<CaptureSnapshot>,
}

impl CaptureState {
    pub fn new() -> Self {
        Self {
            inner: Observable::new(CaptureSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        self.inner.get()
    }

    pub fn photo_capability(&self) -> Option<Arc<dyn PhotoCapability>> {
        self.inner.with(|s| s.photo_capability.clone())
    }

    pub fn video_capability(&self) -> Option<Arc<dyn VideoCapability>> {
        self.inner.with(|s| s.video_capability.clone())
    }

    pub fn active_recording(&self) -> Option<Arc<dyn ActiveRecording>> {
        self.inner.with(|s| s.active_recording.clone())
    }

    pub fn is_recording(&self) -> bool {
        self.inner.with(|s| s.is_recording)
    }

    pub fn photo_ready(&self) -> bool {
        self.inner.with(CaptureSnapshot::photo_ready)
    }

    pub fn video_ready(&self) -> bool {
        self.inner.with(CaptureSnapshot::video_ready)
    }

    pub fn phase(&self) -> RecordingPhase {
        self.inner.with(CaptureSnapshot::phase)
    }

    pub fn set_capabilities(
        &self,
        photo: Option<Arc<dyn PhotoCapability>>,
        video: Option<Arc<dyn VideoCapability>>,
    ) {
        self.inner.update(|s| {
            s.photo_capability = photo;
            s.video_capability = video;
        });
        debug!("Capture capabilities updated");
    }

    pub fn set_active_recording(&self, recording: Option<Arc<dyn ActiveRecording>>) {
        self.inner.update(|s| s.active_recording = recording);
    }

    /// Clear the active recording, returning it
    pub fn take_active_recording(&self) -> Option<Arc<dyn ActiveRecording>> {
        self.inner.update(|s| s.active_recording.take())
    }

    pub fn set_recording(&self, is_recording: bool) {
        self.inner.update(|s| s.is_recording = is_recording);
    }

    /// Apply several field changes as one notification
    pub fn update<R>(&self, mutate: impl FnOnce(&mut CaptureSnapshot) -> R) -> R {
        self.inner.update(mutate)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CaptureSnapshot) + Send + Sync + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }

    pub fn watch(&self) -> watch::Receiver<CaptureSnapshot> {
        self.inner.watch()
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::new()
    }
}
