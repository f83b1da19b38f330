mod handle;
mod orchestrator;
mod runtime;
mod shutdown;
mod types;


pub use handle::AppHandle;
pub use orchestrator::CameraApp;
pub use types::{AppCommand, ShutdownReason};
