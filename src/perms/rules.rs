//! Rule compilation for sub-repo permissions
//!
//! Turns a repository's raw path patterns into an ordered list of compiled
//! matchers. Matching is rooted (every pattern and every queried path gets
//! a leading `/`) and path-separator-aware: `*` never crosses `/`, `**`
//! does. Inclusion rules additionally grant their ancestor directories so
//! that a client can browse down to a permitted leaf.

use crate::error::PermsError;
use globset::{GlobBuilder, GlobMatcher};

/// An ordered sequence of compiled rules for one repository.
///
/// Order must be preserved exactly as compiled: evaluation depends on the
/// latest-declared matching rule winning.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

/// A single compiled path rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    matcher: RuleMatcher,
    exclusion: bool,
    source: String,
}

/// The executable form of a rule.
#[derive(Debug, Clone)]
enum RuleMatcher {
    /// A compiled glob, whole-path match.
    Glob(GlobMatcher),
    /// A literal directory path with trailing `/`, exact match. Ancestor
    /// rules are deliberately non-glob so that metacharacters in a parent
    /// segment are matched verbatim.
    Dir(String),
    /// Matches any path ending in `/`. Stands in for the ancestor set of a
    /// wildcard-rooted rule, where no concrete prefix can be derived.
    AnyDir,
}

impl CompiledRule {
    fn glob(pattern: &str, exclusion: bool) -> Result<Self, PermsError> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| PermsError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            matcher: RuleMatcher::Glob(matcher),
            exclusion,
            source: pattern.to_string(),
        })
    }

    fn dir(path: String) -> Self {
        Self {
            matcher: RuleMatcher::Dir(path.clone()),
            exclusion: false,
            source: path,
        }
    }

    fn any_dir() -> Self {
        Self {
            matcher: RuleMatcher::AnyDir,
            exclusion: false,
            source: "**/".to_string(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            RuleMatcher::Glob(glob) => glob.is_match(path),
            RuleMatcher::Dir(dir) => path == dir,
            RuleMatcher::AnyDir => path.ends_with('/'),
        }
    }

    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    /// The normalized pattern this rule was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl RuleSet {
    /// Compile a repository's raw path patterns, in order.
    ///
    /// Any pattern failing glob compilation aborts the whole set with
    /// [`PermsError::InvalidPattern`] naming the offending pattern.
    pub fn compile(paths: &[String]) -> Result<Self, PermsError> {
        let mut rules = Vec::with_capacity(paths.len());

        for raw in paths {
            let (pattern, exclusion) = match raw.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (raw.as_str(), false),
            };
            let pattern = if pattern.starts_with('/') {
                pattern.to_string()
            } else {
                format!("/{pattern}")
            };

            rules.push(CompiledRule::glob(&pattern, exclusion)?);

            // Peel leading `/**` segments one at a time so the suffix is
            // also present as its own rule, rooted at depth zero.
            let mut remainder = pattern.as_str();
            while let Some(rest) = remainder.strip_prefix("/**") {
                if !rest.starts_with('/') {
                    break;
                }
                rules.push(CompiledRule::glob(rest, exclusion)?);
                remainder = rest;
            }

            if !exclusion {
                expand_ancestor_dirs(&pattern, &mut rules);
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Append one non-exclusionary rule per ancestor directory of `pattern`,
/// walking from its last `/` back to (but not including) the leading one.
///
/// A wildcard-rooted pattern has no enumerable ancestors; it gets a single
/// catch-all directory rule instead.
fn expand_ancestor_dirs(pattern: &str, rules: &mut Vec<CompiledRule>) {
    if pattern.starts_with("/*") {
        rules.push(CompiledRule::any_dir());
        return;
    }

    let mut rest = pattern;
    loop {
        let Some(idx) = rest.rfind('/') else { break };
        if idx == 0 {
            break;
        }
        rest = &rest[..idx];
        rules.push(CompiledRule::dir(format!("{rest}/")));
    }
}
