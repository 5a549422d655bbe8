//! Periodic health monitoring.
//!
//! Every `interval_secs` the monitor checks all registered services and lets
//! the registry refresh their flags. The first round runs immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::check::HealthChecker;
use crate::registry::ServiceRegistry;

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    checker: HealthChecker,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, checker: HealthChecker, config: HealthCheckConfig) -> Self {
        Self {
            registry,
            checker,
            config,
        }
    }

    /// Check on every tick until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Periodic health checks disabled");
            return;
        }

        let period = Duration::from_secs(self.config.interval_secs.max(1));
        tracing::info!(interval_secs = period.as_secs(), "Health monitor starting");

        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.round().await;
                }
                _ = shutdown.recv() => break,
            }
        }
        tracing::info!("Health monitor stopped");
    }

    /// One check round. Returns the number of healthy services.
    pub async fn round(&self) -> usize {
        let results = self.registry.perform_health_checks(&self.checker).await;
        let healthy = results.values().filter(|o| o.is_healthy()).count();
        tracing::debug!(services = results.len(), healthy, "Health round complete");
        healthy
    }
}
