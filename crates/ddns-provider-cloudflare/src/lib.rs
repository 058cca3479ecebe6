// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider implementation for the DDNS
// system.
//
// ## Behavior
//
// - One HTTP request per trait call (zone lookup, record lookup, update)
// - HTTP timeout configured (30 seconds) on every call
// - Every response is decoded as the v4 envelope `{success, errors, result}`;
//   `success: false` is surfaced with the provider's errors verbatim
// - Dry-run mode for safe testing (lookups run, the update is only logged)
// - ❌ NO retry or backoff (the scheduler retries on its next tick)
// - ❌ NO caching of zone or record IDs (the remote side may change)
// - ❌ NO record creation
//
// ## Security Requirements
//
// - API token NEVER appears in logs or error messages
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=A`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::error::{ProviderMessage, ReconcileError, Result, Step};
use ddns_core::traits::{DnsProvider, DnsRecord, Zone, RECORD_TTL};
use ddns_core::Config;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default, deserialize_with = "errors_or_empty")]
    errors: Vec<ProviderMessage>,
    result: Option<T>,
}

/// `errors` may be absent or `null` on a rejected call
fn errors_or_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<ProviderMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ProviderMessage>>::deserialize(deserializer)?.unwrap_or_default())
}

/// PUT body for a record update
#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    ttl: u32,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Per-request timeout
    timeout: Duration,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider (live mode) from a validated config
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, CLOUDFLARE_API_BASE)
    }

    /// Create a provider talking to a different API base URL
    pub fn with_base_url(config: &Config, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            ReconcileError::transport(Step::Startup, format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            api_token: config.api_token().to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: DEFAULT_HTTP_TIMEOUT,
            dry_run: false,
        })
    }

    /// Override the 30 second per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send an authenticated request and decode the envelope
    ///
    /// Transport failures and bodies that are not an envelope become
    /// `Transport` errors; the caller decides what `success: false` means.
    async fn send<T: DeserializeOwned>(
        &self,
        step: Step,
        request: RequestBuilder,
    ) -> Result<Envelope<T>> {
        let response = request
            .timeout(self.timeout)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReconcileError::transport(
                        step,
                        format!("Request timed out after {:?}", self.timeout),
                    )
                } else {
                    ReconcileError::transport(step, format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ReconcileError::transport(step, format!("Failed to read response: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            ReconcileError::transport(step, format!("{} ({})", describe_status(status), e))
        })
    }
}

/// Describe a status whose body could not be decoded
fn describe_status(status: StatusCode) -> String {
    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Status: {}", status),
        500..=599 => format!("Cloudflare server error (transient). Status: {}", status),
        _ => format!("Unexpected response. Status: {}", status),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn resolve_zone(&self, name: &str) -> Result<Zone> {
        tracing::debug!("Looking up zone ID for domain: {}", name);

        let url = format!("{}/zones", self.base_url);
        let envelope: Envelope<Vec<Zone>> = self
            .send(Step::ZoneLookup, self.client.get(&url).query(&[("name", name)]))
            .await?;

        if !envelope.success {
            return Err(ReconcileError::rejected(Step::ZoneLookup, envelope.errors));
        }

        envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .find(|zone| zone.name == name)
            .ok_or_else(|| ReconcileError::ZoneNotFound(name.to_string()))
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn resolve_record(&self, zone_id: &str, hostname: &str) -> Result<DnsRecord> {
        tracing::debug!("Looking up record ID: {} (type: A)", hostname);

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let envelope: Envelope<Vec<DnsRecord>> = self
            .send(
                Step::RecordLookup,
                self.client
                    .get(&url)
                    .query(&[("name", hostname), ("type", "A")]),
            )
            .await?;

        if !envelope.success {
            return Err(ReconcileError::rejected(Step::RecordLookup, envelope.errors));
        }

        // First match is authoritative
        envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| ReconcileError::RecordNotFound(hostname.to_string()))
    }

    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {"type": "A", "name": "home.example.com", "content": "1.2.3.4", "ttl": 300}
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        hostname: &str,
        content: Ipv4Addr,
    ) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);
        let payload = RecordUpdate {
            record_type: "A",
            name: hostname,
            content: content.to_string(),
            ttl: RECORD_TTL,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload).unwrap_or_default()
            );
            return Ok(());
        }

        let envelope: Envelope<serde_json::Value> = self
            .send(Step::RecordUpdate, self.client.put(&url).json(&payload))
            .await?;

        if !envelope.success {
            return Err(ReconcileError::UpdateFailed(envelope.errors.into()));
        }

        tracing::debug!("DNS record updated: {} -> {}", hostname, content);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
