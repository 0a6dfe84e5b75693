//! Path matching for the rewrite bypass list.
//!
//! # Responsibilities
//! - Match exact paths (payment webhook, health check)
//! - Match path prefixes on segment boundaries (framework assets)
//! - Match static asset paths (last segment carries a known asset extension)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Any matcher hit excludes the request from interception

use crate::config::BypassConfig;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches one path exactly.
#[derive(Debug, Clone)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        path == self.path || path.strip_suffix('/') == Some(self.path.as_str())
    }
}

/// Matches a path prefix ending on a segment boundary:
/// `/_assets` matches `/_assets` and `/_assets/app.js`, not `/_assetsx`.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Matches paths whose last segment is a file with one of the configured
/// asset extensions (`/favicon.ico`). Dotted page slugs such as
/// `/learn/lesson-1.2` do not match unless their suffix is listed.
#[derive(Debug, Clone, Default)]
pub struct StaticFileMatcher {
    /// Lowercased, without the leading dot.
    extensions: Vec<String>,
}

impl StaticFileMatcher {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }
}

impl Matcher for StaticFileMatcher {
    fn matches(&self, path: &str) -> bool {
        let last = path.rsplit('/').next().unwrap_or_default();
        match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }
}

/// Static exclusion list evaluated before any rewrite.
#[derive(Debug, Default)]
pub struct BypassList {
    matchers: Vec<Box<dyn Matcher>>,
}

impl BypassList {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn from_config(config: &BypassConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        for path in &config.exact_paths {
            matchers.push(Box::new(ExactPathMatcher::new(path.clone())));
        }
        for prefix in &config.prefixes {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }
        if !config.static_extensions.is_empty() {
            matchers.push(Box::new(StaticFileMatcher::new(&config.static_extensions)));
        }
        Self::new(matchers)
    }

    /// Returns true if the path must not be intercepted.
    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}
