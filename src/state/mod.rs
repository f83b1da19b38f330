mod capture_state;
mod observable;

pub use capture_state::{CaptureSnapshot, CaptureState, RecordingPhase};
pub use observable::{Observable, SubscriptionId};
