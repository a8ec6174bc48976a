//! Hot reload of sub-repo permissions configuration
//!
//! The host's configuration subsystem publishes [`SubRepoConfig`] values on
//! a watch channel; this task applies the current value and every
//! subsequent change to a client. Applying is atomic: an in-flight
//! permission check observes either the old settings or the new ones,
//! never a torn mix.

use crate::client::SubRepoPermsClient;
use crate::config::types::SubRepoConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Apply configuration updates from `updates` to `client` until the
/// sending side is dropped.
pub fn spawn_config_watch(
    client: Arc<SubRepoPermsClient>,
    mut updates: watch::Receiver<SubRepoConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let current = updates.borrow_and_update().clone();
        client.apply_config(&current);

        while updates.changed().await.is_ok() {
            let config = updates.borrow_and_update().clone();
            debug!(
                enabled = config.enabled,
                cache_size = config.user_cache_size,
                ttl_secs = config.user_cache_ttl_seconds,
                "applying sub-repo permissions configuration"
            );
            client.apply_config(&config);
        }
    })
}
