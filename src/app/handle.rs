use super::types::{AppCommand, ShutdownReason};
use crate::error::{AppError, Result};
use crate::platform::SurfaceHandle;
use tokio::sync::mpsc;
use tracing::debug;

/// Cloneable sender of commands to a running [`CameraApp`](super::CameraApp)
#[derive(Debug, Clone)]
pub struct AppHandle {
    sender: mpsc::UnboundedSender<AppCommand>,
}

impl AppHandle {
    pub(super) fn new(sender: mpsc::UnboundedSender<AppCommand>) -> Self {
        Self { sender }
    }

    pub fn send(&self, command: AppCommand) -> Result<()> {
        debug!("Sending command {:?}", command);
        self.sender
            .send(command)
            .map_err(|_| AppError::system("Camera session is no longer running"))
    }

    pub fn surface_ready(&self, surface: SurfaceHandle) -> Result<()> {
        self.send(AppCommand::SurfaceReady(surface))
    }

    pub fn take_photo(&self) -> Result<()> {
        self.send(AppCommand::TakePhoto)
    }

    pub fn toggle_video(&self) -> Result<()> {
        self.send(AppCommand::ToggleVideo)
    }

    pub fn rebind(&self) -> Result<()> {
        self.send(AppCommand::Rebind)
    }

    pub fn shutdown(&self, reason: ShutdownReason) -> Result<()> {
        self.send(AppCommand::Shutdown(reason))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
