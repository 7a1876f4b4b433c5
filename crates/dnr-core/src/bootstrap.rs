//! Listener registration at startup

use crate::config::ManifestVersion;
use crate::notify::UpdateNotifier;
use crate::partition::ConfigName;
use crate::sync::SyncEngine;
use std::sync::Arc;
use tracing::debug;

/// Register `engine` for updates to every configuration.
///
/// Hosts without a declarative rule table get no listeners. Returns the
/// number of registrations made.
pub fn register_listeners(
    notifier: &UpdateNotifier,
    engine: Arc<SyncEngine>,
    manifest_version: ManifestVersion,
) -> usize {
    if !manifest_version.uses_declarative_rules() {
        debug!(?manifest_version, "Declarative rules unavailable, not registering");
        return 0;
    }
    for name in ConfigName::ALL {
        notifier.on_update(name, engine.clone());
    }
    ConfigName::ALL.len()
}
