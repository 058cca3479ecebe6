// # Instance Metadata Address Source
//
// This crate provides the public IPv4 address source for the DDNS system.
//
// ## Precondition
//
// The address comes from the cloud instance-metadata service at
// `http://169.254.169.254/latest/meta-data/public-ipv4`. That endpoint is only
// reachable from matching cloud infrastructure; anywhere else every lookup
// fails with `AddressDiscoveryFailed`.
//
// ## Behavior
//
// - One GET per `current()` call with a 10 second timeout
// - No caching: each reconciliation attempt sees the live address
// - The whitespace-trimmed body must be an IPv4 literal

use ddns_core::traits::AddressSource;
use ddns_core::{ReconcileError, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Metadata endpoint returning the instance's public IPv4 address
pub const METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/public-ipv4";

/// HTTP timeout for metadata lookups
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the public address from the instance-metadata service
#[derive(Debug, Clone)]
pub struct MetadataAddressSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,

    /// Per-request timeout
    timeout: Duration,
}

impl MetadataAddressSource {
    /// Create a source for the standard metadata endpoint
    pub fn new() -> Result<Self> {
        Self::with_url(METADATA_URL)
    }

    /// Create a source for a custom URL (tests, proxies)
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ReconcileError::address(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Override the 10 second per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Parse a metadata response body into an address
fn parse_address(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    if text.is_empty() {
        return Err(ReconcileError::address("Metadata service returned an empty body"));
    }

    text.parse()
        .map_err(|_| ReconcileError::address(format!("Invalid IPv4 address: {}", text)))
}

#[async_trait::async_trait]
impl AddressSource for MetadataAddressSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReconcileError::address(format!("Request timed out after {:?}", self.timeout))
                } else {
                    ReconcileError::address(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(ReconcileError::address(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReconcileError::address(format!("Failed to read response: {}", e)))?;

        let address = parse_address(&body)?;
        tracing::debug!("Metadata service reported {}", address);
        Ok(address)
    }

    fn source_name(&self) -> &'static str {
        "metadata"
    }
}
