use super::CaptureActions;
use crate::error::CaptureError;
use crate::events::{AppEvent, Notification};
use crate::platform::{RecordEvent, RecordingId, RecordingRequest};
use tracing::{debug, error, info, warn};

/// What a video toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoAction {
    Started { id: RecordingId, with_audio: bool },
    Stopped(RecordingId),
    /// Nothing to start or stop
    Ignored,
}

impl CaptureActions {
    /// Stop the active recording, or start a new one when none is active
    pub fn capture_video(&self) -> Result<VideoAction, CaptureError> {
        if let Some(recording) = self.state.take_active_recording() {
            let id = recording.id();
            info!("Stopping recording {}", id);
            recording.stop();
            self.publish_phase();
            return Ok(VideoAction::Stopped(id));
        }

        if self.state.is_recording() {
            debug!("Previous recording is still finalizing, ignoring toggle");
            return Ok(VideoAction::Ignored);
        }

        let Some(video) = self.state.video_capability() else {
            debug!("Video requested before camera was bound, ignoring");
            return Ok(VideoAction::Ignored);
        };

        let with_audio = self.gate.microphone_granted();
        if !with_audio {
            warn!("Microphone permission not granted, recording without audio");
        }

        let request = RecordingRequest {
            target: self.targets.video(),
            with_audio,
        };
        info!(
            "Starting recording {} (audio: {})",
            request.target.display_name, with_audio
        );

        let recording = video.start_recording(request, self.record_tx.clone())?;
        let id = recording.id();
        self.state.set_active_recording(Some(recording));
        self.publish_phase();

        Ok(VideoAction::Started { id, with_audio })
    }

    /// Apply one event from a recording's event stream
    pub fn handle_record_event(&self, event: RecordEvent) {
        match event {
            RecordEvent::Start { recording } => {
                let started = self.state.update(|s| {
                    let current = s.active_recording_id() == Some(recording);
                    if current {
                        s.is_recording = true;
                    }
                    current
                });

                if started {
                    info!("Recording {} started", recording);
                    self.publish_phase();
                } else {
                    debug!("Start event for recording {} that is no longer active", recording);
                }
            }
            RecordEvent::Status {
                recording,
                recorded,
                bytes,
            } => {
                debug!(
                    "Recording {}: {:.1}s, {} bytes",
                    recording,
                    recorded.as_secs_f64(),
                    bytes
                );
            }
            RecordEvent::Finalize { recording, result } => {
                let (owned, handle) = self.state.update(|s| {
                    let current = s.active_recording_id() == Some(recording);
                    let handle = if current {
                        s.active_recording.take()
                    } else {
                        None
                    };
                    // A newer recording keeps its own flag
                    if current || s.active_recording.is_none() {
                        s.is_recording = false;
                    }
                    (current, handle)
                });

                match result {
                    Ok(location) => {
                        if owned {
                            info!("Recording {} ended without a stop request", recording);
                        }
                        info!("Recording {} saved to {}", recording, location.path.display());
                        self.event_bus
                            .emit(AppEvent::notify(Notification::VideoSaved { location }));
                    }
                    Err(e) => {
                        if let Some(handle) = handle {
                            handle.close();
                        }
                        error!("Video capture failed for recording {}: {}", recording, e);
                    }
                }
                self.publish_phase();
            }
        }
    }

    /// Release the active recording, if any, when the session goes away
    pub fn release_recording(&self) {
        let handle = self.state.update(|s| {
            s.is_recording = false;
            s.active_recording.take()
        });
        if let Some(handle) = handle {
            info!("Closing recording {} at session end", handle.id());
            handle.close();
            self.publish_phase();
        }
    }
}
