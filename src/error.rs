use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Camera binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl AppError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Permission gate failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PermissionError {
    #[error("Permission prompt was dismissed without a response")]
    PromptDismissed,
}

/// Failures while acquiring the provider or binding capabilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    #[error("No rendering surface is available")]
    NoSurface,

    #[error("Camera permission is not granted")]
    CameraPermissionMissing,

    #[error("Camera provider unavailable: {details}")]
    ProviderUnavailable { details: String },

    #[error("No camera matches selector {selector}")]
    NoMatchingCamera { selector: String },

    #[error("No supported video quality for selector {selector}")]
    NoSupportedQuality { selector: String },

    #[error("Use case binding failed: {details}")]
    BindFailed { details: String },
}

/// Photo or video capture failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capability is not bound to a camera")]
    NotBound,

    #[error("A recording is already active")]
    RecordingActive,

    #[error("Failed to write {path}: {details}")]
    Storage { path: String, details: String },

    #[error("Encoding failed: {details}")]
    Encoding { details: String },

    #[error("Camera closed while capturing")]
    CameraClosed,

    #[error("Recording source became inactive")]
    SourceInactive,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, AppError>;
