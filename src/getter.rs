//! Upstream permissions source
//!
//! Defines the trait the engine fetches raw sub-repo permissions through.
//! Implementations live with the host (a database, a sync service); the
//! engine only ever reads.

use crate::error::GetterError;
use crate::perms::types::{RepoId, RepoName, SubRepoPermissions, UserId};
use std::collections::HashMap;
use std::sync::Arc;

// async_trait required for dyn-compatibility with Arc<dyn SubRepoPermissionsGetter>
use async_trait::async_trait;

/// Source of raw sub-repo permissions.
///
/// `get_by_user` may block on network or database I/O; the engine
/// propagates caller context by awaiting it directly and shields
/// concurrent callers behind its own cache.
#[async_trait]
pub trait SubRepoPermissionsGetter: Send + Sync {
    /// Fetch the raw rule lists for every repository the user has partial
    /// access to. Repositories absent from the map carry no sub-repo
    /// restrictions for this user.
    async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<RepoName, SubRepoPermissions>, GetterError>;

    /// Whether the upstream source has ever computed sub-repo rules for
    /// this repository, independent of any particular user.
    async fn repo_supported(&self, repo: &str) -> Result<bool, GetterError>;

    /// Same as [`repo_supported`](Self::repo_supported), keyed by id.
    async fn repo_id_supported(&self, repo_id: RepoId) -> Result<bool, GetterError>;
}

/// Shared handle type alias for getter implementations.
pub type SharedGetter = Arc<dyn SubRepoPermissionsGetter>;
