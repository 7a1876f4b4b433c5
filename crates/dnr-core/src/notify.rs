//! Configuration update notifications
//!
//! The host announces a new dataset version by calling
//! [`UpdateNotifier::notify`] with the configuration's name and tag. Every
//! listener registered for that name runs in registration order. Dispatch
//! for one configuration is serialized: a notification that arrives while
//! another for the same name is still being handled waits for it to finish,
//! while notifications for different names run independently.

use crate::partition::ConfigName;
use crate::store::lock;
use crate::sync::SyncOutcome;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;

/// Receives update notifications for the configurations it registered for
#[async_trait]
pub trait UpdateListener: Send + Sync {
    async fn on_update(&self, name: ConfigName, etag: &str) -> Result<SyncOutcome>;
}

/// Results of dispatching one notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Outcome of each listener that succeeded, in dispatch order
    pub outcomes: Vec<SyncOutcome>,
    /// Errors of listeners that failed
    pub errors: Vec<String>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Listener registry with per-configuration dispatch gates
pub struct UpdateNotifier {
    listeners: Mutex<HashMap<ConfigName, Vec<Arc<dyn UpdateListener>>>>,
    gates: [AsyncMutex<()>; ConfigName::ALL.len()],
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateNotifier {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            gates: std::array::from_fn(|_| AsyncMutex::new(())),
        }
    }

    /// Register `listener` for updates to `name`.
    pub fn on_update(&self, name: ConfigName, listener: Arc<dyn UpdateListener>) {
        lock(&self.listeners).entry(name).or_default().push(listener);
    }

    pub fn listener_count(&self, name: ConfigName) -> usize {
        lock(&self.listeners).get(&name).map_or(0, Vec::len)
    }

    /// Dispatch a notification to every listener registered for `name`.
    ///
    /// A failing listener is logged and recorded in the report; the
    /// remaining listeners still run.
    pub async fn notify(&self, name: ConfigName, etag: &str) -> DispatchReport {
        self.notify_with(name, etag, || ()).await
    }

    /// Run `deliver` and dispatch `etag`, both under the gate for `name`.
    ///
    /// Hosts that store the dataset for `etag` in `deliver` are guaranteed
    /// that no other dispatch for `name` observes it before this one.
    pub async fn notify_with<F>(&self, name: ConfigName, etag: &str, deliver: F) -> DispatchReport
    where
        F: FnOnce() + Send,
    {
        let _gate = self.gates[name.index()].lock().await;
        deliver();
        let listeners = lock(&self.listeners)
            .get(&name)
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for listener in listeners {
            match listener.on_update(name, etag).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    warn!(config = %name, etag, error = %e, "Update listener failed");
                    report.errors.push(e.to_string());
                }
            }
        }
        report
    }
}
