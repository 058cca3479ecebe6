// # Address Source Trait
//
// Defines the interface for discovering the machine's current public IPv4
// address.
//
// ## Implementations
//
// - Instance metadata service: `ddns-ip-metadata` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::AddressSource;
//
// #[tokio::main]
// async fn main() -> ddns_core::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let address = source.current().await?;
//     println!("public address: {}", address);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public address discovery
///
/// Every call performs a fresh lookup; implementations must not cache the
/// address between calls, since the reconciler relies on each attempt seeing
/// the live value.
///
/// # Errors
///
/// Anything that prevents a usable address (transport failures, non-2xx
/// responses, empty or non-IPv4 bodies) is reported as
/// [`ReconcileError::AddressDiscoveryFailed`](crate::ReconcileError::AddressDiscoveryFailed).
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the current public IPv4 address
    async fn current(&self) -> Result<Ipv4Addr, crate::ReconcileError>;

    /// Short name for logging (e.g., "metadata")
    fn source_name(&self) -> &'static str;
}
