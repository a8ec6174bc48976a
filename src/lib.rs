//! Sub-Repository Permissions Engine
//!
//! A library answering one question: given a user and a repository they
//! already have access to, which file paths inside it may they read?
//!
//! ## Features
//!
//! - **Glob rules with last-match-wins precedence** - ordered
//!   include/exclude patterns where the latest declared rule overrides
//!   earlier ones for the same path
//! - **Ancestor directory expansion** - including a leaf also grants the
//!   directories on the way down, so file browsers can traverse into a
//!   permitted subtree
//! - **Per-user caching** - compiled rules live in a bounded LRU with a
//!   freshness TTL; concurrent misses for one user collapse into a single
//!   upstream fetch
//! - **Hot-reloadable configuration** - the site-wide toggle, cache size,
//!   and TTL apply atomically at runtime
//!
//! ## Rule model
//!
//! ```text
//! [sub_repo_permissions]
//! enabled = true                  # site-wide toggle, off by default
//! user_cache_size = 1000          # users with cached compiled rules
//! user_cache_ttl_seconds = 10     # freshness window per entry
//! ```
//!
//! A repository's rules are plain glob patterns, `-` marking exclusions:
//!
//! ```text
//! /**                 # everything readable...
//! -/storage/**        # ...except the storage tree (declared later, wins)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use subrepo_perms::{RepoContent, SubRepoPermsClient, SharedGetter};
//! # async fn example(getter: SharedGetter) -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(SubRepoPermsClient::new(getter));
//! let perms = client
//!     .permissions(42, &RepoContent::new("repo-a", "src/main.rs"))
//!     .await?;
//! if perms.is_read() {
//!     // serve the file
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod getter;
pub mod metrics;
pub mod perms;

// Re-export main types
pub use cache::{RepoRules, UserPermsCache};
pub use client::SubRepoPermsClient;
pub use config::{SiteConfig, SubRepoConfig, load_config, load_config_from_str, spawn_config_watch};
pub use error::{ConfigError, GetterError, PermsError};
pub use getter::{SharedGetter, SubRepoPermissionsGetter};
pub use metrics::{MetricsSnapshot, PermsMetrics};
pub use perms::{FilePermissions, Perms, RepoContent, RuleSet, SubRepoPermissions};
