pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod keyboard_input;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;

pub use app::{AppCommand, AppHandle, CameraApp, ShutdownReason};
pub use capture::{CaptureActions, CaptureChannels, PhotoResult, VideoAction};
pub use config::AppConfig;
pub use error::{AppError, BindingError, CaptureError, EventBusError, PermissionError, Result};
pub use events::{AppEvent, EventBus, EventFilter, EventReceiver, Notification};
pub use permissions::{GateOutcome, InMemoryPermissions, Permission, PermissionGate, PermissionService};
pub use platform::{
    ActiveRecording, CameraProvider, CameraSelector, LifecycleScope, PhotoCapability,
    ProviderSource, Quality, QualitySelector, RecordEvent, SurfaceHandle, VideoCapability,
};
#[cfg(feature = "simulated")]
pub use platform::SimulatedCamera;
pub use session::SessionBinder;
pub use state::{CaptureSnapshot, CaptureState, RecordingPhase};
pub use storage::{FileMediaStore, OutputTarget, OutputTargetFactory, SavedLocation};
