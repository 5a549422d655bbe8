//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Resolve an inbound path to a service and rewritten backend path
//! - Return an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction; reloads swap a whole new table
//! - Longest prefix wins, so specific routes shadow general ones

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Per-request routing decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Route name, for logs and metrics.
    pub route: String,
    pub service: String,
    /// Backend path including the query string.
    pub rewritten_path: String,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    name: String,
    service: String,
    matcher: PathPrefixMatcher,
}

/// Compiled routing table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes: Vec<CompiledRoute> = configs
            .iter()
            .map(|c| CompiledRoute {
                name: c.name.clone(),
                service: c.service.clone(),
                matcher: PathPrefixMatcher::new(c.path_prefix.clone(), c.upstream_path.clone()),
            })
            .collect();
        routes.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));

        for route in &routes {
            tracing::debug!(
                route = %route.name,
                prefix = %route.matcher.prefix(),
                service = %route.service,
                upstream_root = %route.matcher.upstream_root(),
                "Route compiled"
            );
        }
        Self { routes }
    }

    /// Resolve a path (and query) to its target.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Option<ProxyTarget> {
        self.routes
            .iter()
            .find(|r| r.matcher.matches(path))
            .map(|r| ProxyTarget {
                route: r.name.clone(),
                service: r.service.clone(),
                rewritten_path: r.matcher.rewrite(path, query),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
