// # IP Source Trait
//
// Defines the interface for discovering the current public IP address.
//
// ## Implementations
//
// - HTTP-based: `cfdns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfdns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.resolve().await?;
//     println!("public address: {current_ip}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - One discovery attempt per call; no internal retry
/// - No background tasks and no caching between calls
/// - The returned string is passed to the reconciler as-is, so an
///   implementation decides how much validation it performs
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address as reported by the source
    /// - `Err(Error)`: Transport failure, unexpected status, or read failure
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
