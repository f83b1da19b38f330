use super::CaptureActions;
use crate::error::CaptureError;
use crate::events::{AppEvent, Notification};
use crate::storage::{OutputTarget, SavedLocation};
use tracing::{debug, error, info};

/// Completion of one still capture
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoResult {
    pub target: OutputTarget,
    pub result: Result<SavedLocation, CaptureError>,
}

impl CaptureActions {
    /// Capture a still image into a fresh timestamped target.
    ///
    /// Returns `None` without side effects when no photo capability is bound.
    /// The result arrives later on the photo result channel.
    pub fn take_photo(&self) -> Option<OutputTarget> {
        let Some(photo) = self.state.photo_capability() else {
            debug!("Photo requested before camera was bound, ignoring");
            return None;
        };

        let target = self.targets.photo();
        info!("Taking photo {}", target.display_name);

        let tx = self.photo_tx.clone();
        let pending = target.clone();
        tokio::spawn(async move {
            let result = photo.take_picture(pending.clone()).await;
            if tx
                .send(PhotoResult {
                    target: pending,
                    result,
                })
                .is_err()
            {
                debug!("Photo result dropped, session is gone");
            }
        });

        Some(target)
    }

    /// Surface a finished capture; failures are only logged
    pub fn handle_photo_result(&self, completed: PhotoResult) {
        match completed.result {
            Ok(location) => {
                info!(
                    "Photo {} saved to {}",
                    completed.target.display_name,
                    location.path.display()
                );
                self.event_bus
                    .emit(AppEvent::notify(Notification::PhotoSaved { location }));
            }
            Err(e) => {
                error!(
                    "Photo capture failed for {}: {}",
                    completed.target.display_name, e
                );
            }
        }
    }
}
