use super::photo::PhotoResult;
use crate::events::{AppEvent, EventBus};
use crate::permissions::PermissionGate;
use crate::platform::RecordEvent;
use crate::state::CaptureState;
use crate::storage::OutputTargetFactory;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Receivers for asynchronous capture completions.
///
/// The owner of the capture state drains these and hands each item back to
/// [`CaptureActions`], so state is only mutated from one task.
pub struct CaptureChannels {
    pub photo_results: mpsc::UnboundedReceiver<PhotoResult>,
    pub record_events: mpsc::UnboundedReceiver<RecordEvent>,
}

/// Photo and video actions against the bound capabilities
pub struct CaptureActions {
    pub(super) state: Arc<CaptureState>,
    pub(super) targets: OutputTargetFactory,
    pub(super) gate: Arc<PermissionGate>,
    pub(super) event_bus: EventBus,
    pub(super) photo_tx: mpsc::UnboundedSender<PhotoResult>,
    pub(super) record_tx: mpsc::UnboundedSender<RecordEvent>,
}

impl CaptureActions {
    pub fn new(
        state: Arc<CaptureState>,
        targets: OutputTargetFactory,
        gate: Arc<PermissionGate>,
        event_bus: EventBus,
    ) -> (Self, CaptureChannels) {
        let (photo_tx, photo_results) = mpsc::unbounded_channel();
        let (record_tx, record_events) = mpsc::unbounded_channel();

        let actions = Self {
            state,
            targets,
            gate,
            event_bus,
            photo_tx,
            record_tx,
        };
        let channels = CaptureChannels {
            photo_results,
            record_events,
        };
        (actions, channels)
    }

    pub fn state(&self) -> &Arc<CaptureState> {
        &self.state
    }

    pub(super) fn publish_phase(&self) {
        let snapshot = self.state.snapshot();
        let phase = snapshot.phase();
        debug!("Recording phase is now {:?}", phase);
        self.event_bus.emit(AppEvent::RecordingChanged {
            recording: snapshot.active_recording_id(),
            phase,
        });
    }
}
