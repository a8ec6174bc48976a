//! Configuration for the permissions engine
//!
//! Serde types for the site configuration, a layered loader (TOML file +
//! `SUBREPO_*` environment overrides), and a watch task that hot-applies
//! changes to a running client.

pub mod loader;
pub mod types;
pub mod watch;

pub use loader::{load_config, load_config_from_str};
pub use types::{SiteConfig, SubRepoConfig};
pub use watch::spawn_config_watch;
