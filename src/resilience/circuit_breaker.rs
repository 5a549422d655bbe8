//! Circuit breaker for service protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: service assumed down, requests fail fast
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Closed: open_duration elapsed (checked on admit), or any success
//! ```
//!
//! There is no single-trial half-open state: once the open window has
//! elapsed every caller is admitted until the next failure streak.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Thresholds shared by every circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerPolicy {
    pub failure_threshold: u32,
    pub open_duration: Duration,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(60),
        }
    }
}

impl From<&CircuitBreakerConfig> for BreakerPolicy {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            open_duration: Duration::from_secs(config.open_duration_secs),
        }
    }
}

/// Failure tracking for one service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitState {
    pub consecutive_failures: u32,
    pub open: bool,
    /// Set exactly when `open` is true.
    pub opened_at: Option<Instant>,
}

/// Read-only view of a circuit for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSnapshot {
    pub state: &'static str,
    pub consecutive_failures: u32,
    /// Seconds until an open circuit admits calls again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Per-service circuit breakers keyed by service name.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    policy: BreakerPolicy,
    circuits: DashMap<String, CircuitState>,
}

impl CircuitBreakerRegistry {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            circuits: DashMap::new(),
        }
    }

    pub fn policy(&self) -> BreakerPolicy {
        self.policy
    }

    /// Whether a call to `service` may proceed.
    pub fn admit(&self, service: &str) -> bool {
        self.admit_at(service, Instant::now())
    }

    /// `admit` evaluated at a given instant.
    pub fn admit_at(&self, service: &str, now: Instant) -> bool {
        let Some(mut state) = self.circuits.get_mut(service) else {
            return true;
        };
        if !state.open {
            return true;
        }

        let elapsed = state
            .opened_at
            .map(|opened| now.saturating_duration_since(opened))
            .unwrap_or(self.policy.open_duration);

        if elapsed < self.policy.open_duration {
            tracing::debug!(
                service = %service,
                elapsed_secs = elapsed.as_secs(),
                "Circuit open, rejecting call"
            );
            metrics::record_circuit_rejection(service);
            return false;
        }

        *state = CircuitState::default();
        drop(state);
        tracing::info!(service = %service, "Circuit open window elapsed, closing");
        metrics::record_circuit_state(service, false);
        true
    }

    /// A call completed its round trip: reset and close the circuit.
    pub fn record_success(&self, service: &str) {
        let mut state = self.circuits.entry(service.to_string()).or_default();
        let was_open = state.open;
        *state = CircuitState::default();
        drop(state);

        if was_open {
            tracing::info!(service = %service, "Circuit closed after success");
            metrics::record_circuit_state(service, false);
        }
    }

    /// A call failed at the transport level.
    pub fn record_failure(&self, service: &str) {
        self.record_failure_at(service, Instant::now());
    }

    /// `record_failure` evaluated at a given instant.
    pub fn record_failure_at(&self, service: &str, now: Instant) {
        let mut state = self.circuits.entry(service.to_string()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        let failures = state.consecutive_failures;

        let opened = !state.open && failures >= self.policy.failure_threshold;
        if opened {
            state.open = true;
            state.opened_at = Some(now);
        }
        drop(state);

        if opened {
            tracing::warn!(
                service = %service,
                failures,
                open_secs = self.policy.open_duration.as_secs(),
                "Circuit opened"
            );
            metrics::record_circuit_state(service, true);
        } else {
            tracing::debug!(service = %service, failures, "Recorded call failure");
        }
    }

    /// Current state of one circuit, if any outcome was ever recorded.
    pub fn state(&self, service: &str) -> Option<CircuitState> {
        self.circuits.get(service).map(|s| *s)
    }

    /// Snapshot of every tracked circuit, ordered by service name.
    pub fn snapshot(&self) -> BTreeMap<String, CircuitSnapshot> {
        let now = Instant::now();
        self.circuits
            .iter()
            .map(|entry| {
                let state = entry.value();
                let retry_after_secs = state.opened_at.filter(|_| state.open).map(|opened| {
                    self.policy
                        .open_duration
                        .saturating_sub(now.saturating_duration_since(opened))
                        .as_secs()
                });
                let snapshot = CircuitSnapshot {
                    state: if state.open { "open" } else { "closed" },
                    consecutive_failures: state.consecutive_failures,
                    retry_after_secs,
                };
                (entry.key().clone(), snapshot)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakers() -> CircuitBreakerRegistry {
        CircuitBreakerRegistry::new(BreakerPolicy::default())
    }

    #[test]
    fn unknown_service_is_admitted_without_state() {
        let cb = breakers();
        assert!(cb.admit("never-seen"));
        assert!(cb.state("never-seen").is_none());
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = breakers();
        let t0 = Instant::now();

        cb.record_failure_at("list-service", t0);
        cb.record_failure_at("list-service", t0);
        assert!(cb.admit_at("list-service", t0));

        cb.record_failure_at("list-service", t0);
        let state = cb.state("list-service").unwrap();
        assert!(state.open);
        assert_eq!(state.consecutive_failures, 3);
        assert_eq!(state.opened_at, Some(t0));

        assert!(!cb.admit_at("list-service", t0));
        assert!(!cb.admit_at("list-service", t0 + Duration::from_secs(59)));
    }

    #[test]
    fn resets_once_open_window_elapsed() {
        let cb = breakers();
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.record_failure_at("item-service", t0);
        }

        assert!(cb.admit_at("item-service", t0 + Duration::from_secs(61)));
        assert_eq!(cb.state("item-service"), Some(CircuitState::default()));

        // A fresh streak is needed to reopen.
        let t1 = t0 + Duration::from_secs(62);
        cb.record_failure_at("item-service", t1);
        assert!(cb.admit_at("item-service", t1));
    }

    #[test]
    fn success_resets_failures_and_closes() {
        let cb = breakers();
        let t0 = Instant::now();
        cb.record_failure_at("user-service", t0);
        cb.record_failure_at("user-service", t0);
        cb.record_success("user-service");
        assert_eq!(cb.state("user-service").unwrap().consecutive_failures, 0);

        for _ in 0..3 {
            cb.record_failure_at("user-service", t0);
        }
        assert!(!cb.admit_at("user-service", t0));
        cb.record_success("user-service");
        assert!(cb.admit_at("user-service", t0));
        assert!(!cb.state("user-service").unwrap().open);
    }

    #[test]
    fn circuits_are_independent() {
        let cb = breakers();
        let t0 = Instant::now();
        for _ in 0..3 {
            cb.record_failure_at("list-service", t0);
        }
        assert!(!cb.admit_at("list-service", t0));
        assert!(cb.admit_at("item-service", t0));
    }

    #[test]
    fn snapshot_reports_open_circuits() {
        let cb = CircuitBreakerRegistry::new(BreakerPolicy {
            failure_threshold: 1,
            open_duration: Duration::from_secs(60),
        });
        cb.record_failure("item-service");
        cb.record_success("user-service");

        let snapshot = cb.snapshot();
        assert_eq!(snapshot["item-service"].state, "open");
        assert!(snapshot["item-service"].retry_after_secs.unwrap() <= 60);
        assert_eq!(snapshot["user-service"].state, "closed");
        assert_eq!(snapshot["user-service"].retry_after_secs, None);
    }

    #[test]
    fn policy_from_config() {
        let policy = BreakerPolicy::from(&CircuitBreakerConfig {
            failure_threshold: 5,
            open_duration_secs: 10,
            trip_on_server_error: true,
        });
        assert_eq!(policy.failure_threshold, 5);
        assert_eq!(policy.open_duration, Duration::from_secs(10));
    }
}
