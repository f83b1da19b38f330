use crate::error::EventBusError;
use crate::permissions::Permission;
use crate::platform::{Quality, RecordingId};
use crate::state::RecordingPhase;
use crate::storage::SavedLocation;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Short-lived messages shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PhotoSaved { location: SavedLocation },
    VideoSaved { location: SavedLocation },
    PermissionDenied { missing: Vec<Permission> },
}

impl Notification {
    /// Text shown in the toast
    pub fn message(&self) -> String {
        match self {
            Notification::PhotoSaved { location } => {
                format!("Photo capture succeeded: {}", location.uri)
            }
            Notification::VideoSaved { location } => {
                format!("Video capture succeeded: {}", location.uri)
            }
            Notification::PermissionDenied { .. } => "Permission request denied".to_string(),
        }
    }
}

/// Events that can occur in a camera session
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A user-visible notification
    Notify {
        notification: Notification,
        timestamp: SystemTime,
    },
    /// Capabilities were bound to a camera
    CameraBound {
        camera_id: String,
        video_quality: Quality,
        timestamp: SystemTime,
    },
    /// All capabilities were released
    CameraUnbound { timestamp: SystemTime },
    /// The recording phase changed
    RecordingChanged {
        recording: Option<RecordingId>,
        phase: RecordingPhase,
    },
    /// Session shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl AppEvent {
    pub fn notify(notification: Notification) -> Self {
        AppEvent::Notify {
            notification,
            timestamp: SystemTime::now(),
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            AppEvent::Notify { notification, .. } => notification.message(),
            AppEvent::CameraBound {
                camera_id,
                video_quality,
                ..
            } => format!("Camera {} bound (video {})", camera_id, video_quality),
            AppEvent::CameraUnbound { .. } => "Camera unbound".to_string(),
            AppEvent::RecordingChanged { recording, phase } => match recording {
                Some(id) => format!("Recording {} is {:?}", id, phase),
                None => format!("Recording is {:?}", phase),
            },
            AppEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            AppEvent::Notify { .. } => "notify",
            AppEvent::CameraBound { .. } => "camera_bound",
            AppEvent::CameraUnbound { .. } => "camera_unbound",
            AppEvent::RecordingChanged { .. } => "recording_changed",
            AppEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        debug!("Publishing event: {}", event.description());

        match &event {
            AppEvent::Notify { notification, .. } => {
                info!("Notification: {}", notification.message());
            }
            AppEvent::CameraBound { .. } => info!("{}", event.description()),
            AppEvent::CameraUnbound { .. } => info!("Camera unbound"),
            AppEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            AppEvent::RecordingChanged { .. } => debug!("{}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish, tolerating a bus nobody listens to
    pub fn emit(&self, event: AppEvent) {
        if let Err(e) = self.publish(event) {
            debug!("Event dropped: {}", e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&AppEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<AppEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(receiver: broadcast::Receiver<AppEvent>, filter: EventFilter, name: String) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<AppEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<AppEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::PublishFailed {
                        details: format!("Receiver lagged behind by {} events", n),
                    });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

/// Receiver that only yields user-visible notifications
pub fn notifications(bus: &EventBus) -> EventReceiver {
    EventReceiver::new(
        bus.subscribe(),
        EventFilter::EventTypes(vec!["notify"]),
        "notifications".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::time::{timeout, Duration};

    fn location() -> SavedLocation {
        SavedLocation {
            uri: "content://media/external/images/media/7".to_string(),
            path: PathBuf::from("/tmp/a.jpg"),
        }
    }

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let subscriber_count = event_bus
            .publish(AppEvent::notify(Notification::PhotoSaved {
                location: location(),
            }))
            .unwrap();
        assert_eq!(subscriber_count, 1);

        match receiver.recv().await.unwrap() {
            AppEvent::Notify { notification, .. } => {
                assert_eq!(
                    notification.message(),
                    "Photo capture succeeded: content://media/external/images/media/7"
                );
            }
            _ => panic!("Unexpected event type"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_fails_but_emit_does_not() {
        let event_bus = EventBus::new(10);
        assert!(!event_bus.has_subscribers());
        assert!(event_bus
            .publish(AppEvent::CameraUnbound {
                timestamp: SystemTime::now()
            })
            .is_err());
        event_bus.emit(AppEvent::CameraUnbound {
            timestamp: SystemTime::now(),
        });
    }

    #[tokio::test]
    async fn test_notification_receiver_skips_other_events() {
        let event_bus = EventBus::new(10);
        let mut toasts = notifications(&event_bus);

        event_bus.emit(AppEvent::CameraUnbound {
            timestamp: SystemTime::now(),
        });
        event_bus.emit(AppEvent::notify(Notification::PermissionDenied {
            missing: vec![Permission::Camera],
        }));

        let received = timeout(Duration::from_millis(100), toasts.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.event_type(), "notify");
        assert_eq!(received.description(), "Permission request denied");
        assert!(toasts.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_event_properties() {
        let event = AppEvent::CameraBound {
            camera_id: "0".to_string(),
            video_quality: Quality::Fhd,
            timestamp: SystemTime::now(),
        };
        assert_eq!(event.event_type(), "camera_bound");
        assert!(event.description().contains("FHD"));
    }
}
