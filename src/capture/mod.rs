mod actions;
mod photo;
mod video;

pub use actions::{CaptureActions, CaptureChannels};
pub use photo::PhotoResult;
pub use video::VideoAction;
