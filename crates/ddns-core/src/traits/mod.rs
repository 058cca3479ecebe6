//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces the reconciler depends on.
//!
//! - [`AddressSource`]: Discover the current public IPv4 address
//! - [`DnsProvider`]: Look up and update the managed A record

pub mod address_source;
pub mod dns_provider;

pub use address_source::AddressSource;
pub use dns_provider::{DnsProvider, DnsRecord, Zone, RECORD_TTL};
