//! Background worker for continuous Janitor operation

use crate::{Janitor, JanitorConfig, JanitorError, JanitorMetrics};
use kinship_domain::traits::RelationStore;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::time::{interval, Duration};

/// Background worker that repairs every network on a schedule
///
/// The store is shared with the request path; the lock is taken for one
/// sweep at a time and never held while waiting for the next tick.
///
/// # Examples
///
/// ```no_run
/// use kinship_janitor::{JanitorConfig, JanitorWorker};
/// use kinship_store::SqliteStore;
/// use std::sync::{Arc, Mutex};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(Mutex::new(SqliteStore::new("kinship.db")?));
///     let mut worker = JanitorWorker::new(JanitorConfig::default());
///
///     // Run until Ctrl+C
///     worker.run(store).await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker {
    janitor: Janitor,
    interval: Duration,
}

impl JanitorWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        let interval = config.repair_interval();
        Self {
            janitor: Janitor::new(config),
            interval,
        }
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    fn sweep_shared<S>(&mut self, store: &Mutex<S>) -> Result<JanitorMetrics, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let mut store = store
            .lock()
            .map_err(|e| JanitorError::Worker(format!("Store lock error: {}", e)))?;
        self.janitor.sweep(&mut *store)
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// Failed sweeps are logged and retried on the next tick.
    pub async fn run<S>(&mut self, store: Arc<Mutex<S>>) -> Result<(), JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!("Janitor worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting repair sweep");

                    match self.sweep_shared(&store) {
                        Ok(metrics) => {
                            tracing::info!(
                                "Sweep completed: {} networks, {} rows repaired",
                                metrics.networks_repaired,
                                metrics.total_changes()
                            );
                        }
                        Err(e) => {
                            tracing::error!("Sweep failed: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
            }
        }

        tracing::info!("Janitor stopped. Final metrics:\n{}", self.janitor.metrics().summary());
        Ok(())
    }

    /// Run a fixed number of sweeps; the first runs immediately
    pub async fn run_cycles<S>(&mut self, store: Arc<Mutex<S>>, cycles: usize) -> Result<(), JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting repair sweep {}/{}", cycle + 1, cycles);

            if let Err(e) = self.sweep_shared(&store) {
                tracing::error!("Sweep {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Janitor finished {} cycles. Final metrics:\n{}",
            cycles,
            self.janitor.metrics().summary()
        );
        Ok(())
    }

    /// Get a reference to the janitor's current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        self.janitor.metrics()
    }

    /// Reset the janitor's metrics counters
    pub fn reset_metrics(&mut self) {
        self.janitor.reset_metrics();
    }
}
