//! Update loop engine
//!
//! The UpdateEngine is responsible for:
//! - Discovering the public IP via IpSource
//! - Reconciling the A record via Reconciler
//! - Sleeping between cycles until shutdown is requested
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ip    ┌──────────────┐  list/create/update  ┌──────────────┐
//! │  IpSource   │───────▶│ UpdateEngine │────────────────────▶│ DnsRegistrar │
//! └─────────────┘         └──────────────┘      (Reconciler)     └──────────────┘
//!                                 │
//!                                 ▼
//!                         ┌───────────────┐
//!                         │ UpdateMetrics │
//!                         └───────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the public IP; on failure log, skip the rest of the cycle
//! 2. Stop here if shutdown was requested meanwhile
//! 3. Reconcile the record; log failure if any
//! 4. Sleep the configured interval, waking early on shutdown

use crate::error::{Error, Result};
use crate::metrics::UpdateMetrics;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::traits::IpSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Result of a single update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The record was reconciled
    Reconciled(ReconcileOutcome),

    /// IP discovery failed; the registrar was not contacted
    ResolveFailed {
        error: String,
    },

    /// Reconciliation failed
    ReconcileFailed {
        error: String,
    },

    /// Shutdown was requested between resolve and reconcile
    Cancelled,
}

/// Periodic IP → DNS reconciliation loop
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`]
/// 2. Start with [`UpdateEngine::run()`], passing a shutdown receiver
/// 3. Send `true` on the matching sender (or drop it) to stop
///
/// Cycles are strictly sequential; one never overlaps the next.
pub struct UpdateEngine {
    /// IP source for discovering the public address
    ip_source: Arc<dyn IpSource>,

    /// Reconciler for the managed record
    reconciler: Reconciler,

    /// Shared counters
    metrics: Arc<UpdateMetrics>,

    /// Pause between cycles
    sleep_interval: Duration,
}

impl UpdateEngine {
    /// Create a new update engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `reconciler`: Reconciler for the managed record
    /// - `metrics`: Counters shared with the HTTP front
    /// - `sleep_interval`: Pause between cycles (must be > 0)
    pub fn new(
        ip_source: Arc<dyn IpSource>,
        reconciler: Reconciler,
        metrics: Arc<UpdateMetrics>,
        sleep_interval: Duration,
    ) -> Result<Self> {
        if sleep_interval.is_zero() {
            return Err(Error::config("Sleep interval must be > 0"));
        }

        Ok(Self {
            ip_source,
            reconciler,
            metrics,
            sleep_interval,
        })
    }

    /// Run the loop until shutdown is requested
    ///
    /// The first cycle starts immediately. Shutdown is observed between the
    /// resolve and reconcile steps and during the inter-cycle sleep. Dropping
    /// the sender half counts as a shutdown request.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            fqdn = %self.reconciler.host(),
            source = self.ip_source.source_name(),
            registrar = self.reconciler.registrar_name(),
            interval = ?self.sleep_interval,
            "Update loop started"
        );

        loop {
            if is_shutdown(&shutdown) {
                break;
            }

            if self.cycle(Some(&shutdown)).await == CycleOutcome::Cancelled {
                break;
            }

            debug!(interval = ?self.sleep_interval, "Finished update, sleeping");

            tokio::select! {
                _ = tokio::time::sleep(self.sleep_interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!("Shutdown signal received, update loop stopped");
        Ok(())
    }

    /// Run a single resolve → reconcile cycle
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.cycle(None).await
    }

    async fn cycle(&self, shutdown: Option<&watch::Receiver<bool>>) -> CycleOutcome {
        debug!(fqdn = %self.reconciler.host(), "Starting update of host");

        let ip = match self.ip_source.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                error!(error = %e, "Failed to get IP");
                self.metrics.record_resolve_error();
                self.metrics.record_cycle();
                return CycleOutcome::ResolveFailed {
                    error: e.to_string(),
                };
            }
        };
        debug!(ip = %ip, "Got IP");

        if shutdown.is_some_and(is_shutdown) {
            return CycleOutcome::Cancelled;
        }

        let outcome = match self.reconciler.reconcile(&ip).await {
            Ok(outcome) => CycleOutcome::Reconciled(outcome),
            Err(e) => {
                error!(error = %e, "Failed to update DNS");
                self.metrics.record_reconcile_error();
                CycleOutcome::ReconcileFailed {
                    error: e.to_string(),
                }
            }
        };

        self.metrics.record_cycle();
        outcome
    }
}

fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    // A closed channel means nobody can ask us to stop any more; treat it as a stop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
