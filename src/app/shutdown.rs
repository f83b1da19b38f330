use super::CameraApp;
use crate::error::Result;
use crate::events::AppEvent;
use std::time::SystemTime;
use tracing::{info, warn};

impl CameraApp {
    /// End the lifecycle scope and release the camera backend.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub async fn shutdown(&mut self) -> Result<i32> {
        if self.shut_down {
            return Ok(0);
        }
        self.shut_down = true;
        info!("Beginning graceful shutdown");

        self.actions.release_recording();

        // Teardowns registered by the binder unbind the camera here
        self.scope.end();

        let remaining = self
            .binder
            .provider()
            .map(|p| p.bound_session_count())
            .unwrap_or(0);
        let exit_code = if remaining > 0 {
            warn!("{} camera session(s) still bound after scope end", remaining);
            self.binder.unbind();
            1
        } else {
            0
        };

        self.source.shutdown();
        self.state.set_capabilities(None, None);
        tokio::task::yield_now().await;
        let drained = self.pump();
        if drained > 0 {
            info!("Handled {} completion(s) during shutdown", drained);
        }

        self.event_bus.emit(AppEvent::CameraUnbound {
            timestamp: SystemTime::now(),
        });

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
