//! Prefix matching and path rewriting.
//!
//! # Design Decisions
//! - Prefixes match on a segment boundary ("/api/items" does not match "/api/itemsx")
//! - Path matching is case-sensitive
//! - The remainder after the prefix is appended to the upstream root
//! - Rewritten paths always start with exactly one '/'

/// Matches an external path prefix and maps it onto an upstream root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
    upstream_root: String,
}

impl PathPrefixMatcher {
    /// Create a matcher. Without an explicit upstream root the prefix's outer
    /// segment is dropped: "/api/items" maps onto "/items".
    pub fn new(prefix: impl Into<String>, upstream_root: Option<String>) -> Self {
        let prefix = normalize_root(&prefix.into());
        let upstream_root = match upstream_root {
            Some(root) => normalize_root(&root),
            None => drop_outer_segment(&prefix),
        };
        Self {
            prefix,
            upstream_root,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn upstream_root(&self) -> &str {
        &self.upstream_root
    }

    /// Returns true if `path` (no query string) falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Rewrite a matching path (and optional query) onto the upstream root.
    pub fn rewrite(&self, path: &str, query: Option<&str>) -> String {
        let remainder = if self.prefix == "/" {
            path
        } else {
            path.strip_prefix(self.prefix.as_str()).unwrap_or("")
        };
        let remainder = remainder.trim_start_matches('/');

        let mut rewritten = if remainder.is_empty() {
            self.upstream_root.clone()
        } else if self.upstream_root == "/" {
            format!("/{}", remainder)
        } else {
            format!("{}/{}", self.upstream_root, remainder)
        };

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            rewritten.push('?');
            rewritten.push_str(q);
        }
        rewritten
    }
}

/// "/" or "/a/b" form: one leading slash, no trailing slash.
fn normalize_root(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn drop_outer_segment(prefix: &str) -> String {
    match prefix.trim_start_matches('/').split_once('/') {
        Some((_, rest)) => normalize_root(rest),
        None => "/".to_string(),
    }
}
