// # DNS Registrar Trait
//
// Defines the interface to the registrar API that owns the managed zone.
//
// ## Implementations
//
// - Cloudflare: `cfdns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfdns_core::{DnsRegistrar, A_RECORD};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registrar = /* DnsRegistrar implementation */;
//
//     let zone_id = registrar.zone_id("example.com").await?;
//     let records = registrar
//         .list_records(&zone_id, "home.example.com", A_RECORD)
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// DNS record type managed by cfdnsupdater
pub const A_RECORD: &str = "A";

/// A DNS record as stored by the registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Registrar-assigned opaque identifier
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type ("A")
    pub record_type: String,
    /// Record content (the IP address string for A records)
    pub content: String,
}

/// Trait for registrar API clients
///
/// Every method maps to exactly one API request.
///
/// # Trust Level: Untrusted
///
/// Registrars perform HTTP calls to their own endpoints only. They do not
/// retry, spawn tasks, cache zone or record identifiers between calls, or
/// decide whether an update is needed. Those decisions belong to
/// [`crate::Reconciler`].
#[async_trait]
pub trait DnsRegistrar: Send + Sync {
    /// Look up the identifier of a zone by its name
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: If the account has no such zone
    async fn zone_id(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// List records in a zone matching `name` and `record_type`
    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create a record
    async fn create_record(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<DnsRecord, crate::Error>;

    /// Change the content of an existing record, leaving all other fields as they are
    async fn update_record_content(
        &self,
        zone_id: &str,
        record_id: &str,
        content: &str,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}
