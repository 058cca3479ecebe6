// # ddns-core
//
// Core library for the Cloudflare A-record DDNS system.
//
// ## Architecture Overview
//
// This library keeps one DNS A record pointed at the machine's public IPv4
// address:
// - **AddressSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for resolving and updating the record via a provider API
// - **Reconciler**: One discover → compare → (update) attempt
// - **Scheduler**: Runs the reconciler at startup and then every 60 seconds
//
// ## Design Principles
//
// 1. **Remote is the source of truth**: zone and record are re-fetched every attempt
// 2. **Write only on mismatch**: an unchanged address never issues an update
// 3. **Attempt isolation**: one failed attempt never stops the next one
// 4. **Library-First**: the daemon is a thin wrapper around this crate

pub mod traits;
pub mod reconciler;
pub mod scheduler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressSource, DnsProvider, DnsRecord, Zone, RECORD_TTL};
pub use reconciler::{Outcome, Reconciler, root_domain};
pub use scheduler::{AttemptEvent, Scheduler};
pub use config::Config;
pub use error::{ProviderErrors, ProviderMessage, ReconcileError, Result, Step};
