//! Per-client rate limiting.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::http::response::ApiResponse;
use crate::observability::metrics;

/// Idle buckets are swept once every this many checks.
const SWEEP_EVERY: u64 = 1024;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token buckets keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    rps: f64,
    burst: f64,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            rps: config.requests_per_second as f64,
            burst: config.burst_size.max(1) as f64,
            checks: AtomicU64::new(0),
        }
    }

    /// Take one token for `client`, returning false when it has none left.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        let allowed = {
            let mut bucket = self
                .buckets
                .entry(client)
                .or_insert_with(|| TokenBucket::new(self.burst, now));
            bucket.try_acquire(self.burst, self.rps, now)
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_idle_at(now);
        }
        allowed
    }

    /// Drop buckets idle long enough to have refilled to capacity. Such a
    /// bucket is indistinguishable from a fresh one.
    fn evict_idle_at(&self, now: Instant) {
        if self.rps <= 0.0 {
            return;
        }
        let refill_window = Duration::from_secs_f64(self.burst / self.rps);
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) < refill_window);
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.buckets.len(), "Evicted idle rate limit buckets");
        }
    }
}

/// Middleware rejecting clients over their budget with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    // Requests without peer info (in-process callers) are not limited.
    let Some(client) = client else {
        return next.run(request).await;
    };

    if limiter.check(client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        metrics::record_rate_limited("rps_limit");
        (StatusCode::TOO_MANY_REQUESTS, ApiResponse::error("Rate limit exceeded")).into_response()
    }
}
