use super::types::{Permission, PermissionSet};
use crate::error::PermissionError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Platform permission subsystem
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Whether the permission is currently granted
    fn is_granted(&self, permission: Permission) -> bool;

    /// Show a multi-permission prompt and wait for the user's answers
    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<HashMap<Permission, bool>, PermissionError>;
}

/// Result of running the permission gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Every required permission is granted
    Granted,
    /// Camera is granted but other required permissions are not
    Partial { missing: Vec<Permission> },
    /// Camera permission is missing
    Denied { missing: Vec<Permission> },
}

impl GateOutcome {
    /// Whether the camera session may be started
    pub fn allows_binding(&self) -> bool {
        !matches!(self, GateOutcome::Denied { .. })
    }

    /// Whether the user should see a denial notification
    pub fn is_denial(&self) -> bool {
        !matches!(self, GateOutcome::Granted)
    }

    pub fn missing(&self) -> &[Permission] {
        match self {
            GateOutcome::Granted => &[],
            GateOutcome::Partial { missing } | GateOutcome::Denied { missing } => missing,
        }
    }
}

/// Checks and requests the permissions the camera session needs
pub struct PermissionGate {
    service: Arc<dyn PermissionService>,
    required: PermissionSet,
}

impl PermissionGate {
    pub fn new(service: Arc<dyn PermissionService>, api_level: u32) -> Self {
        let required = PermissionSet::required(api_level);
        debug!(
            "Required permissions for API level {}: {:?}",
            api_level,
            required.as_slice()
        );
        Self { service, required }
    }

    pub fn required(&self) -> &PermissionSet {
        &self.required
    }

    /// True only if every required permission is currently granted
    pub fn permissions_granted(&self) -> bool {
        self.required.iter().all(|p| self.service.is_granted(p))
    }

    pub fn camera_granted(&self) -> bool {
        self.service.is_granted(Permission::Camera)
    }

    /// Checked at recording start, never cached
    pub fn microphone_granted(&self) -> bool {
        self.service.is_granted(Permission::RecordAudio)
    }

    /// Prompt for the required permissions and classify the answers
    pub async fn request_permissions(&self) -> GateOutcome {
        info!("Requesting permissions: {:?}", self.required.as_slice());

        match self.service.request(self.required.as_slice()).await {
            Ok(results) => self.evaluate(&results),
            Err(e) => {
                warn!("Permission request failed: {}", e);
                GateOutcome::Denied {
                    missing: self.required.as_slice().to_vec(),
                }
            }
        }
    }

    /// Use current grants when complete, otherwise prompt
    pub async fn ensure(&self) -> GateOutcome {
        if self.permissions_granted() {
            debug!("All required permissions already granted");
            return GateOutcome::Granted;
        }
        self.request_permissions().await
    }

    /// Classify per-identifier results; unanswered identifiers count as denied
    pub fn evaluate(&self, results: &HashMap<Permission, bool>) -> GateOutcome {
        let missing: Vec<Permission> = self
            .required
            .iter()
            .filter(|p| !results.get(p).copied().unwrap_or(false))
            .collect();

        let outcome = if missing.is_empty() {
            GateOutcome::Granted
        } else if missing.contains(&Permission::Camera) {
            GateOutcome::Denied { missing }
        } else {
            GateOutcome::Partial { missing }
        };

        match &outcome {
            GateOutcome::Granted => info!("All required permissions granted"),
            GateOutcome::Partial { missing } => {
                warn!("Permissions partially granted, missing: {:?}", missing)
            }
            GateOutcome::Denied { missing } => {
                warn!("Permission request denied, missing: {:?}", missing)
            }
        }

        outcome
    }
}
