//! DNS record reconciliation
//!
//! Compares the desired address against the A record stored by the
//! registrar and applies the smallest change that makes them agree:
//!
//! | Records found | Stored content | Action |
//! |---|---|---|
//! | 0 | - | create |
//! | 1 | equal | none |
//! | 1 | different | update content |
//! | 2+ | - | abort with [`Error::AmbiguousRecordSet`] |
//!
//! Every call re-resolves the zone ID and re-lists records; nothing is
//! cached between calls and nothing is retried.

use crate::error::{Error, Result};
use crate::metrics::UpdateMetrics;
use crate::traits::{DnsRegistrar, A_RECORD};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Record did not exist and was created
    Created {
        /// The created content
        ip: String,
    },
    /// Record existed with different content and was changed
    Updated {
        /// Content before the change
        previous_ip: String,
        /// Content after the change
        new_ip: String,
    },
    /// Record already had the desired content (no-op)
    Unchanged {
        /// The current content
        ip: String,
    },
}

/// Keeps one A record in line with the discovered address
pub struct Reconciler {
    registrar: Arc<dyn DnsRegistrar>,
    zone: String,
    host: String,
    metrics: Arc<UpdateMetrics>,
}

impl Reconciler {
    /// Create a reconciler for `host` in `zone`
    pub fn new(
        registrar: Arc<dyn DnsRegistrar>,
        zone: impl Into<String>,
        host: impl Into<String>,
        metrics: Arc<UpdateMetrics>,
    ) -> Self {
        Self {
            registrar,
            zone: zone.into(),
            host: host.into(),
            metrics,
        }
    }

    /// The managed host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Name of the registrar records are written to
    pub fn registrar_name(&self) -> &'static str {
        self.registrar.registrar_name()
    }

    /// Bring the A record for the host in line with `ip`
    ///
    /// Issues at most one write to the registrar. The update counter is
    /// incremented only after a successful create or change.
    pub async fn reconcile(&self, ip: &str) -> Result<ReconcileOutcome> {
        let zone_id = self.registrar.zone_id(&self.zone).await?;

        let records = self
            .registrar
            .list_records(&zone_id, &self.host, A_RECORD)
            .await?;

        match records.as_slice() {
            [] => {
                if let Err(e) = self
                    .registrar
                    .create_record(&zone_id, &self.host, A_RECORD, ip)
                    .await
                {
                    error!(error = %e, "Failed to create DNS record");
                    return Err(e);
                }

                self.metrics.record_update();
                info!(fqdn = %self.host, ip = %ip, "Created a new A record");
                Ok(ReconcileOutcome::Created { ip: ip.to_string() })
            }
            [record] => {
                if record.content == ip {
                    debug!(fqdn = %self.host, ip = %ip, "IP is already correct");
                    return Ok(ReconcileOutcome::Unchanged { ip: ip.to_string() });
                }

                self.registrar
                    .update_record_content(&zone_id, &record.id, ip)
                    .await?;

                self.metrics.record_update();
                info!(
                    dns.question.name = %self.host,
                    source.address = %record.content,
                    destination.address = %ip,
                    event.action = "ip_update",
                    event.dataset = "dns",
                    "IP successfully changed"
                );
                Ok(ReconcileOutcome::Updated {
                    previous_ip: record.content.clone(),
                    new_ip: ip.to_string(),
                })
            }
            many => {
                let err = Error::ambiguous(&self.host, many.len());
                error!(fqdn = %self.host, count = many.len(), "{}", err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_equality() {
        let created = ReconcileOutcome::Created {
            ip: "203.0.113.7".to_string(),
        };
        assert_eq!(created.clone(), created);
        assert_ne!(
            created,
            ReconcileOutcome::Unchanged {
                ip: "203.0.113.7".to_string()
            }
        );
    }
}
