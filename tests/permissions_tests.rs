//! End-to-end permission checks through the public client API

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use subrepo_perms::{
    GetterError, Perms, RepoContent, SubRepoConfig, SubRepoPermissions, SubRepoPermsClient,
    SubRepoPermissionsGetter,
};
use tokio_test::assert_ok;

/// Getter serving a fixed rule map and counting upstream calls.
struct FixtureGetter {
    calls: AtomicUsize,
    rules: HashMap<String, SubRepoPermissions>,
}

impl FixtureGetter {
    fn new(rules: HashMap<String, SubRepoPermissions>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rules,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubRepoPermissionsGetter for FixtureGetter {
    async fn get_by_user(
        &self,
        _user_id: i32,
    ) -> Result<HashMap<String, SubRepoPermissions>, GetterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rules.clone())
    }

    async fn repo_supported(&self, repo: &str) -> Result<bool, GetterError> {
        Ok(self.rules.contains_key(repo))
    }

    async fn repo_id_supported(&self, _repo_id: i32) -> Result<bool, GetterError> {
        Ok(!self.rules.is_empty())
    }
}

fn repo_rules(paths: &[&str]) -> HashMap<String, SubRepoPermissions> {
    let mut rules = HashMap::new();
    rules.insert("repo".to_string(), SubRepoPermissions::new(paths.to_vec()));
    rules
}

fn enabled_client(rules: HashMap<String, SubRepoPermissions>) -> (SubRepoPermsClient, Arc<FixtureGetter>) {
    let getter = Arc::new(FixtureGetter::new(rules));
    let client = SubRepoPermsClient::new(getter.clone());
    client.apply_config(&SubRepoConfig {
        enabled: true,
        ..Default::default()
    });
    (client, getter)
}

async fn check(client: &SubRepoPermsClient, path: &str) -> Perms {
    client
        .permissions(1, &RepoContent::new("repo", path))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_declaration_order_decides_overlapping_rules() {
    let (client, _) = enabled_client(repo_rules(&["/**", "-/dev/*"]));
    assert_eq!(check(&client, "dev/thing").await, Perms::None);

    let (client, _) = enabled_client(repo_rules(&["-/dev/*", "/**"]));
    assert_eq!(check(&client, "dev/thing").await, Perms::Read);
}

#[tokio::test]
async fn test_empty_path_is_readable_under_any_rules() {
    let (client, _) = enabled_client(repo_rules(&[]));
    assert_eq!(check(&client, "").await, Perms::Read);

    let (client, _) = enabled_client(repo_rules(&["-/**"]));
    assert_eq!(check(&client, "").await, Perms::Read);
}

#[tokio::test]
async fn test_repo_without_any_rules_is_fully_readable() {
    let (client, _) = enabled_client(HashMap::new());
    let perms = client.file_permissions(1, "repo").await.unwrap();
    assert_eq!(perms.check("/secret.txt"), Perms::Read);
    assert!(perms.is_unrestricted());
}

#[tokio::test]
async fn test_repo_with_empty_rule_list_denies_paths() {
    // An entry with zero rules is still an entry: the repo supports
    // sub-repo permissions and nothing has been included.
    let (client, _) = enabled_client(repo_rules(&[]));
    assert_eq!(check(&client, "anything.txt").await, Perms::None);
}

#[tokio::test]
async fn test_ancestor_directories_of_included_leaf() {
    let (client, _) = enabled_client(repo_rules(&["/foo/bar/thing.txt"]));
    assert_eq!(check(&client, "foo/").await, Perms::Read);
    assert_eq!(check(&client, "foo/bar/").await, Perms::Read);
    assert_eq!(check(&client, "foo/thing.txt").await, Perms::None);
    assert_eq!(check(&client, "foo/bar/other.txt").await, Perms::None);
}

#[tokio::test]
async fn test_wildcard_rooted_rule_grants_every_directory() {
    let (client, _) = enabled_client(repo_rules(&["**/foo/bar/thing.txt"]));
    assert_eq!(check(&client, "foo/").await, Perms::Read);
}

#[tokio::test]
async fn test_late_exclusion_beats_broad_inclusion() {
    let (client, _) = enabled_client(repo_rules(&["/**", "-/storage/**"]));
    assert_eq!(check(&client, "storage/").await, Perms::None);
    assert_eq!(check(&client, "foo").await, Perms::Read);
}

#[tokio::test]
async fn test_disabled_short_circuits_without_getter_calls() {
    let getter = Arc::new(FixtureGetter::new(repo_rules(&["-/**"])));
    let client = SubRepoPermsClient::new(getter.clone());

    for path in ["", "secret.txt", "deep/nested/file"] {
        let perms = client
            .permissions(1, &RepoContent::new("repo", path))
            .await
            .unwrap();
        assert_eq!(perms, Perms::Read);
    }
    assert_eq!(getter.calls(), 0);
}

#[tokio::test]
async fn test_unauthenticated_rejection_when_enabled() {
    let (client, _) = enabled_client(repo_rules(&["/**"]));
    let err = client.file_permissions(0, "repo").await.unwrap_err();
    assert!(err.is_unauthenticated());

    let err = client
        .permissions(0, &RepoContent::new("repo", "x"))
        .await
        .unwrap_err();
    assert!(err.is_unauthenticated());
}

#[tokio::test]
async fn test_compiling_twice_evaluates_identically() {
    let paths = &["/**", "-/dev/*", "**/docs/readme.md", "-/**/generated"];
    let queries = [
        "dev/thing",
        "dev/",
        "docs/readme.md",
        "a/b/docs/readme.md",
        "x/generated",
        "plain.txt",
        "",
    ];

    let (client_a, _) = enabled_client(repo_rules(paths));
    let (client_b, _) = enabled_client(repo_rules(paths));
    for query in queries {
        assert_eq!(
            check(&client_a, query).await,
            check(&client_b, query).await,
            "divergence on {query:?}"
        );
    }
}

#[tokio::test]
async fn test_repeated_checks_reuse_the_cached_rules() {
    let (client, getter) = enabled_client(repo_rules(&["/**"]));
    for _ in 0..10 {
        check(&client, "file.txt").await;
    }
    assert_eq!(getter.calls(), 1);
}

#[tokio::test]
async fn test_enabled_for_repo_probes() {
    let (client, _) = enabled_client(repo_rules(&["/**"]));
    assert!(tokio_test::assert_ok!(client.enabled_for_repo("repo").await));
    assert!(!client.enabled_for_repo("unknown").await.unwrap());
    assert!(client.enabled_for_repo_id(7).await.unwrap());
}

#[tokio::test]
async fn test_metrics_reflect_traffic() {
    let (client, _) = enabled_client(repo_rules(&["/**"]));
    check(&client, "a.txt").await;
    check(&client, "b.txt").await;

    let snapshot = client.metrics();
    assert_eq!(snapshot.sub_repo_perms_checks_total, 2);
    assert_eq!(snapshot.sub_repo_perms_check_errors_total, 0);
    assert_eq!(snapshot.sub_repo_perms_cache_misses_total, 1);
    assert_eq!(snapshot.sub_repo_perms_cache_hits_total, 1);
}
