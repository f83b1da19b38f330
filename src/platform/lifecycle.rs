use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

type Teardown = Box<dyn FnOnce() + Send>;

/// Application visible-lifetime scope
///
/// Capabilities bound against a scope are released by the teardown callbacks
/// registered on it. Teardowns run once, in reverse registration order, when
/// the scope ends or is dropped.
pub struct LifecycleScope {
    name: String,
    token: CancellationToken,
    ended: AtomicBool,
    teardowns: Mutex<Vec<(String, Teardown)>>,
}

impl LifecycleScope {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
            ended: AtomicBool::new(false),
            teardowns: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        !self.ended.load(Ordering::Acquire)
    }

    /// Register a teardown; a later registration under the same key replaces it.
    /// Returns false if the scope already ended, in which case `teardown` runs now.
    pub fn on_end<F>(&self, key: &str, teardown: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut teardowns = self.teardowns.lock();
        if !self.is_active() {
            drop(teardowns);
            teardown();
            return false;
        }

        teardowns.retain(|(k, _)| k != key);
        teardowns.push((key.to_string(), Box::new(teardown)));
        debug!("Scope '{}' registered teardown '{}'", self.name, key);
        true
    }

    /// Token cancelled when the scope ends
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub async fn ended(&self) {
        self.token.cancelled().await
    }

    /// End the scope and run every registered teardown
    pub fn end(&self) {
        let teardowns = {
            let mut teardowns = self.teardowns.lock();
            if self.ended.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *teardowns)
        };

        info!(
            "Lifecycle scope '{}' ended, running {} teardown(s)",
            self.name,
            teardowns.len()
        );

        for (key, teardown) in teardowns.into_iter().rev() {
            debug!("Scope '{}' running teardown '{}'", self.name, key);
            teardown();
        }

        self.token.cancel();
    }
}

impl Drop for LifecycleScope {
    fn drop(&mut self) {
        self.end();
    }
}
