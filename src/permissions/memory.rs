use super::gate::PermissionService;
use super::types::Permission;
use crate::error::PermissionError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// Permission subsystem backed by in-memory grant sets
///
/// `grant_on_request` models what the user approves when the prompt appears.
pub struct InMemoryPermissions {
    granted: RwLock<HashSet<Permission>>,
    grant_on_request: RwLock<HashSet<Permission>>,
    prompts: AtomicUsize,
    dismiss_prompts: AtomicBool,
}

impl InMemoryPermissions {
    pub fn new(
        granted: impl IntoIterator<Item = Permission>,
        grant_on_request: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            granted: RwLock::new(granted.into_iter().collect()),
            grant_on_request: RwLock::new(grant_on_request.into_iter().collect()),
            prompts: AtomicUsize::new(0),
            dismiss_prompts: AtomicBool::new(false),
        }
    }

    pub fn grant(&self, permission: Permission) {
        self.granted.write().insert(permission);
    }

    pub fn revoke(&self, permission: Permission) {
        self.granted.write().remove(&permission);
    }

    pub fn set_grant_on_request(&self, permissions: impl IntoIterator<Item = Permission>) {
        *self.grant_on_request.write() = permissions.into_iter().collect();
    }

    /// Make the user back out of every prompt without answering
    pub fn set_dismiss_prompts(&self, dismiss: bool) {
        self.dismiss_prompts.store(dismiss, Ordering::Relaxed);
    }

    /// Number of prompts shown so far
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PermissionService for InMemoryPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.read().contains(&permission)
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<HashMap<Permission, bool>, PermissionError> {
        self.prompts.fetch_add(1, Ordering::Relaxed);

        if self.dismiss_prompts.load(Ordering::Relaxed) {
            debug!("Permission prompt dismissed");
            return Err(PermissionError::PromptDismissed);
        }

        let approved = self.grant_on_request.read().clone();
        let mut granted = self.granted.write();
        let mut results = HashMap::with_capacity(permissions.len());

        for permission in permissions {
            let allowed = granted.contains(permission) || approved.contains(permission);
            if allowed {
                granted.insert(*permission);
            }
            debug!("Permission {} -> {}", permission.identifier(), allowed);
            results.insert(*permission, allowed);
        }

        Ok(results)
    }
}
