//! Single-attempt reconciliation
//!
//! The Reconciler is responsible for:
//! - Discovering the current public address via AddressSource
//! - Resolving the zone and A record via DnsProvider
//! - Updating the record only when its content differs
//!
//! ## Flow
//!
//! ```text
//! Start ─▶ AddressDiscovered ─▶ RootDomainDerived ─▶ ZoneResolved ─▶ RecordResolved
//!                                                                        │
//!                                                          ┌─────────────┴────────────┐
//!                                                          ▼                          ▼
//!                                                      Unchanged                   Updated
//! ```
//!
//! Any step may fail; the attempt then stops before the next network call.
//! The update is the only mutating call and always comes last, so a failed
//! attempt never leaves partial state at the provider.

use crate::config::Config;
use crate::error::Result;
use crate::traits::{AddressSource, DnsProvider};
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// Result of a successful reconciliation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record already pointed at the current address; nothing was written
    Unchanged(Ipv4Addr),
    /// The record was rewritten
    Updated {
        /// Record content before the update, as the provider stored it
        from: String,
        /// The address written
        to: Ipv4Addr,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged(address) => write!(f, "unchanged ({})", address),
            Outcome::Updated { from, to } => write!(f, "updated {} -> {}", from, to),
        }
    }
}

/// Derive the root domain of a hostname
///
/// Keeps the last two dot-separated labels. Hostnames with fewer than two
/// labels are returned unchanged.
///
/// ```
/// assert_eq!(ddns_core::root_domain("sub.example.com"), "example.com");
/// assert_eq!(ddns_core::root_domain("localhost"), "localhost");
/// ```
pub fn root_domain(hostname: &str) -> String {
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        hostname.to_string()
    }
}

/// Performs one complete reconciliation attempt per [`reconcile`](Self::reconcile) call
pub struct Reconciler {
    config: Config,
    source: Box<dyn AddressSource>,
    provider: Box<dyn DnsProvider>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `config`: Validated configuration
    /// - `source`: Public address discovery
    /// - `provider`: DNS provider holding the record
    pub fn new(
        config: Config,
        source: Box<dyn AddressSource>,
        provider: Box<dyn DnsProvider>,
    ) -> Self {
        Self {
            config,
            source,
            provider,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one reconciliation attempt
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome::Unchanged)`: The record already holds the address
    /// - `Ok(Outcome::Updated)`: The record was rewritten
    /// - `Err(ReconcileError)`: The attempt stopped at the failing step
    pub async fn reconcile(&self) -> Result<Outcome> {
        let hostname = self.config.hostname();

        let address = self.source.current().await?;
        info!("Current public IP: {} (source: {})", address, self.source.source_name());

        let root = root_domain(hostname);
        debug!("Root domain: {}", root);

        let zone = self.provider.resolve_zone(&root).await?;
        debug!("Zone ID: {} ({})", zone.id, zone.name);

        let record = self.provider.resolve_record(&zone.id, hostname).await?;
        debug!("Record ID: {} (content: {})", record.id, record.content);

        if record.points_to(address) {
            info!("IP unchanged for {}: {}", hostname, address);
            return Ok(Outcome::Unchanged(address));
        }

        self.provider
            .update_record(&zone.id, &record.id, hostname, address)
            .await?;

        info!(
            "Updated {} via {}: {} -> {}",
            hostname,
            self.provider.provider_name(),
            record.content,
            address
        );
        Ok(Outcome::Updated {
            from: record.content,
            to: address,
        })
    }
}
