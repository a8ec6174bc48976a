//! Path permission evaluation
//!
//! Applies a compiled [`RuleSet`] to candidate paths. Precedence is
//! last-match-wins: the rules are scanned in reverse declaration order and
//! the first matching rule decides, so a rule declared later overrides any
//! earlier rule covering the same path. This is the opposite of
//! firewall-style first-match evaluation.

use crate::perms::rules::RuleSet;
use crate::perms::types::Perms;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::trace;

/// Evaluate one path against a repository's compiled rules.
///
/// The empty path stands for the repository itself, which the caller has
/// already been granted; it is readable regardless of the rules. All other
/// paths are rooted with a leading `/` before matching.
pub fn evaluate(rules: &RuleSet, path: &str) -> Perms {
    if path.is_empty() {
        return Perms::Read;
    }

    let path: Cow<'_, str> = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };

    for rule in rules.rules().iter().rev() {
        if rule.matches(&path) {
            trace!(
                rule = rule.source(),
                path = %path,
                exclusion = rule.is_exclusion(),
                "rule matched"
            );
            return if rule.is_exclusion() {
                Perms::None
            } else {
                Perms::Read
            };
        }
    }

    Perms::None
}

/// A per-repository permission checker, bound to one user's compiled rules.
///
/// Cheap to clone and safe to use for many paths in a row, e.g. when
/// filtering a directory listing. A checker without rules grants read on
/// every path: either the feature is disabled or the repository has no
/// sub-repo rules at all.
#[derive(Debug, Clone)]
pub struct FilePermissions {
    rules: Option<Arc<RuleSet>>,
}

impl FilePermissions {
    /// A checker that grants read on every path.
    pub fn all_read() -> Self {
        Self { rules: None }
    }

    /// A checker backed by a repository's compiled rules.
    pub(crate) fn restricted(rules: Arc<RuleSet>) -> Self {
        Self { rules: Some(rules) }
    }

    pub fn check(&self, path: &str) -> Perms {
        match &self.rules {
            None => Perms::Read,
            Some(rules) => evaluate(rules, path),
        }
    }

    /// Whether this checker can only ever answer [`Perms::Read`].
    pub fn is_unrestricted(&self) -> bool {
        self.rules.is_none()
    }

    /// Keep the paths the user may read, preserving input order.
    pub fn filter_paths<I, S>(&self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        paths
            .into_iter()
            .map(Into::into)
            .filter(|path| self.check(path).is_read())
            .collect()
    }
}
