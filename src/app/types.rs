use crate::platform::SurfaceHandle;
use std::fmt;

/// Requests delivered to the coordinator task
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// The UI produced a rendering surface
    SurfaceReady(SurfaceHandle),
    TakePhoto,
    ToggleVideo,
    /// Unbind and bind again, e.g. when returning from background
    Rebind,
    Shutdown(ShutdownReason),
}

/// Session shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    ScopeEnded,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {}", name),
            ShutdownReason::UserRequest => f.write_str("user request"),
            ShutdownReason::ScopeEnded => f.write_str("lifecycle scope ended"),
        }
    }
}
