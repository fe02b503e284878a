// # cfdns-core
//
// Core library for cfdnsupdater: keep one DNS A record pointed at the
// caller's current public IPv4 address.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the current public IP
// - **DnsRegistrar**: Trait for listing, creating and updating records via a registrar API
// - **Reconciler**: Create-or-update logic for a single A record
// - **UpdateEngine**: Cancellable loop driving IpSource → Reconciler on a fixed interval
// - **UpdateMetrics**: Shared atomic counters exported in Prometheus format
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP clients
// 2. **Library-First**: The daemon is a thin wiring layer over this crate
// 3. **No hidden retries**: A failed cycle is retried only by the next cycle

pub mod traits;
pub mod engine;
pub mod reconcile;
pub mod metrics;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsRegistrar, DnsRecord, A_RECORD};
pub use engine::{UpdateEngine, CycleOutcome};
pub use reconcile::{Reconciler, ReconcileOutcome};
pub use metrics::UpdateMetrics;
pub use config::UpdaterConfig;
pub use error::{Error, Result};
