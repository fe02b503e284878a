//! Core traits for cfdnsupdater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IP address
//! - [`DnsRegistrar`]: List, create, and update records via the registrar API

pub mod ip_source;
pub mod dns_registrar;

pub use ip_source::IpSource;
pub use dns_registrar::{DnsRegistrar, DnsRecord, A_RECORD};
