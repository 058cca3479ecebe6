// # DNS Provider Trait
//
// Defines the interface for reading and updating the managed A record via a
// provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone = provider.resolve_zone("example.com").await?;
//     let record = provider.resolve_record(&zone.id, "home.example.com").await?;
//     provider
//         .update_record(&zone.id, &record.id, "home.example.com", [5, 6, 7, 8].into())
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// TTL written with every record update (seconds)
pub const RECORD_TTL: u32 = 300;

/// A provider zone (one root domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider zone ID
    pub id: String,
    /// Zone name, e.g. "example.com"
    pub name: String,
}

/// An A record as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider record ID
    pub id: String,
    /// Record type; always "A" for records this system manages
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Current record content (an IPv4 literal)
    pub content: String,
    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: u32,
}

impl DnsRecord {
    /// Whether the stored content already equals `address`
    ///
    /// Content that does not parse as IPv4 never matches, so it gets
    /// overwritten on the next update.
    pub fn points_to(&self, address: Ipv4Addr) -> bool {
        self.content
            .trim()
            .parse::<Ipv4Addr>()
            .is_ok_and(|current| current == address)
    }
}

/// Trait for DNS provider implementations
///
/// Each method performs exactly one API call. Providers hold no state between
/// calls beyond their credentials and HTTP client.
///
/// ## Responsibilities
///
/// - ✅ Perform the API call and map the response envelope to a result
/// - ✅ Report `success: false` payloads verbatim
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Retry, back off or schedule (owned by `Scheduler`, which only
///   retries on the next tick)
/// - ❌ Create records that don't exist
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Find the zone whose name exactly equals `name`
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The first matching zone
    /// - `Err(ZoneNotFound)`: No zone has that name
    /// - `Err(ProviderRejected)`: The provider answered `success: false`
    /// - `Err(Transport)`: The call itself failed
    async fn resolve_zone(&self, name: &str) -> Result<Zone, crate::ReconcileError>;

    /// Find the A record for `hostname` in `zone_id`
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The first matching record
    /// - `Err(RecordNotFound)`: No A record exists for the hostname
    /// - `Err(ProviderRejected)`: The provider answered `success: false`
    /// - `Err(Transport)`: The call itself failed
    async fn resolve_record(
        &self,
        zone_id: &str,
        hostname: &str,
    ) -> Result<DnsRecord, crate::ReconcileError>;

    /// Point the record at `content` with TTL [`RECORD_TTL`]
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the update
    /// - `Err(UpdateFailed)`: The provider answered `success: false`
    /// - `Err(Transport)`: The call itself failed
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        hostname: &str,
        content: Ipv4Addr,
    ) -> Result<(), crate::ReconcileError>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> DnsRecord {
        DnsRecord {
            id: "r1".to_string(),
            record_type: "A".to_string(),
            name: "home.example.com".to_string(),
            content: content.to_string(),
            ttl: RECORD_TTL,
        }
    }

    #[test]
    fn test_points_to_matching_address() {
        assert!(record("1.2.3.4").points_to(Ipv4Addr::new(1, 2, 3, 4)));
        assert!(!record("1.2.3.4").points_to(Ipv4Addr::new(5, 6, 7, 8)));
    }

    #[test]
    fn test_unparseable_content_never_matches() {
        assert!(!record("").points_to(Ipv4Addr::new(1, 2, 3, 4)));
        assert!(!record("not-an-ip").points_to(Ipv4Addr::new(1, 2, 3, 4)));
    }
}
