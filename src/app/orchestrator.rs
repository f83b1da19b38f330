use super::handle::AppHandle;
use super::types::AppCommand;
use crate::capture::{CaptureActions, CaptureChannels, VideoAction};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::events::{AppEvent, EventBus, Notification};
use crate::permissions::{GateOutcome, PermissionGate, PermissionService};
use crate::platform::{LifecycleScope, ProviderSource, SurfaceHandle};
use crate::session::SessionBinder;
use crate::state::CaptureState;
use crate::storage::OutputTargetFactory;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Coordinator for one camera UI session.
///
/// Owns the capture state and is its only writer. Commands, photo results
/// and recording events all reach it as messages.
pub struct CameraApp {
    pub(super) config: AppConfig,
    pub(super) event_bus: EventBus,
    pub(super) scope: Arc<LifecycleScope>,
    pub(super) source: Arc<dyn ProviderSource>,
    pub(super) gate: Arc<PermissionGate>,
    pub(super) state: Arc<CaptureState>,
    pub(super) binder: SessionBinder,
    pub(super) actions: CaptureActions,
    pub(super) channels: CaptureChannels,
    pub(super) command_tx: mpsc::UnboundedSender<AppCommand>,
    pub(super) command_rx: mpsc::UnboundedReceiver<AppCommand>,
    pub(super) shut_down: bool,
}

impl CameraApp {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn ProviderSource>,
        permissions: Arc<dyn PermissionService>,
    ) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.session.event_bus_capacity);
        let scope = Arc::new(LifecycleScope::new("camera-session"));
        let gate = Arc::new(PermissionGate::new(permissions, config.platform.api_level));
        let state = Arc::new(CaptureState::new());
        let binder = SessionBinder::new(
            Arc::clone(&source),
            Arc::clone(&gate),
            Arc::clone(&scope),
        );
        let targets = OutputTargetFactory::new(&config.storage, config.platform.api_level);
        let (actions, channels) = CaptureActions::new(
            Arc::clone(&state),
            targets,
            Arc::clone(&gate),
            event_bus.clone(),
        );
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        info!(
            "Camera session created (API level {})",
            config.platform.api_level
        );

        Ok(Self {
            config,
            event_bus,
            scope,
            source,
            gate,
            state,
            binder,
            actions,
            channels,
            command_tx,
            command_rx,
            shut_down: false,
        })
    }

    pub fn handle(&self) -> AppHandle {
        AppHandle::new(self.command_tx.clone())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn state(&self) -> &Arc<CaptureState> {
        &self.state
    }

    pub fn scope(&self) -> &Arc<LifecycleScope> {
        &self.scope
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    /// Apply one command; returns false once shutdown was requested
    pub async fn dispatch(&self, command: AppCommand) -> bool {
        debug!("Dispatching {:?}", command);

        match command {
            AppCommand::SurfaceReady(surface) => {
                self.on_surface_ready(surface).await;
            }
            AppCommand::TakePhoto => {
                if let Some(target) = self.actions.take_photo() {
                    debug!("Photo pending for {}", target.display_name);
                }
            }
            AppCommand::ToggleVideo => match self.actions.capture_video() {
                Ok(VideoAction::Started { id, with_audio }) => {
                    debug!("Recording {} requested (audio: {})", id, with_audio);
                }
                Ok(VideoAction::Stopped(id)) => debug!("Recording {} stop requested", id),
                Ok(VideoAction::Ignored) => {}
                Err(e) => error!("Video capture could not start: {}", e),
            },
            AppCommand::Rebind => {
                if let Err(e) = self.start_camera().await {
                    warn!("Rebind failed: {}", e);
                }
            }
            AppCommand::Shutdown(reason) => {
                info!("Shutdown requested: {}", reason);
                self.event_bus.emit(AppEvent::ShutdownRequested {
                    timestamp: SystemTime::now(),
                    reason: reason.to_string(),
                });
                return false;
            }
        }

        true
    }

    /// Run the permission gate, then bind the camera when allowed
    pub async fn on_surface_ready(&self, surface: SurfaceHandle) -> GateOutcome {
        self.binder.set_surface(surface);

        let outcome = self.gate.ensure().await;
        if outcome.is_denial() {
            self.event_bus
                .emit(AppEvent::notify(Notification::PermissionDenied {
                    missing: outcome.missing().to_vec(),
                }));
        }

        if outcome.allows_binding() {
            if let Err(e) = self.start_camera().await {
                warn!("Camera session not started: {}", e);
            }
        } else {
            info!("Camera permission missing, camera session not started");
        }

        outcome
    }

    /// Bind capabilities to the camera and announce the result
    pub async fn start_camera(&self) -> Result<()> {
        if self.shut_down {
            return Err(AppError::component("session", "session already shut down"));
        }

        let bound = self.binder.start_camera(&self.state).await?;
        self.event_bus.emit(AppEvent::CameraBound {
            camera_id: bound.camera.id.clone(),
            video_quality: bound.video_quality,
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    /// Handle every completion already queued; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(result) = self.channels.photo_results.try_recv() {
            self.actions.handle_photo_result(result);
            handled += 1;
        }
        while let Ok(event) = self.channels.record_events.try_recv() {
            self.actions.handle_record_event(event);
            handled += 1;
        }

        handled
    }
}
