//! Test doubles and common utilities for contract tests
//!
//! The doubles implement the provider semantics in memory and count every
//! call so tests can assert which network calls an attempt would make.

#![allow(dead_code)]

use ddns_core::error::{ProviderErrors, ProviderMessage, ReconcileError, Result, Step};
use ddns_core::traits::{AddressSource, DnsProvider, DnsRecord, Zone, RECORD_TTL};
use ddns_core::{Config, Reconciler};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An address source returning a scripted sequence of results
///
/// Once the script is exhausted the last entry repeats.
#[derive(Clone)]
pub struct ScriptedAddressSource {
    script: Arc<Mutex<Vec<Option<Ipv4Addr>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedAddressSource {
    /// Always return `address`
    pub fn fixed(address: Ipv4Addr) -> Self {
        Self::scripted(vec![Some(address)])
    }

    /// Always fail
    pub fn failing() -> Self {
        Self::scripted(vec![None])
    }

    /// `None` entries fail with `AddressDiscoveryFailed`
    pub fn scripted(script: Vec<Option<Ipv4Addr>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let n = self.call_count.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap();
        let entry = script.get(n).or(script.last()).copied().flatten();
        entry.ok_or_else(|| ReconcileError::address("metadata endpoint unreachable"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Recorded arguments of an update_record() call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub hostname: String,
    pub content: Ipv4Addr,
    pub ttl: u32,
}

/// An in-memory DnsProvider that tracks calls
///
/// Clones share zones, records and counters, so a test can keep one clone
/// while the reconciler owns another.
#[derive(Clone)]
pub struct MockDnsProvider {
    zones: Arc<Vec<Zone>>,
    records: Arc<Mutex<Vec<DnsRecord>>>,
    reject_zones: Option<ProviderErrors>,
    reject_records: Option<ProviderErrors>,
    reject_update: Option<ProviderErrors>,
    zone_calls: Arc<AtomicUsize>,
    record_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<UpdateCall>>>,
}

impl MockDnsProvider {
    pub fn new(zones: Vec<Zone>, records: Vec<DnsRecord>) -> Self {
        Self {
            zones: Arc::new(zones),
            records: Arc::new(Mutex::new(records)),
            reject_zones: None,
            reject_records: None,
            reject_update: None,
            zone_calls: Arc::new(AtomicUsize::new(0)),
            record_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer the zone lookup with `success: false`
    pub fn rejecting_zones(mut self, message: &str) -> Self {
        self.reject_zones = Some(provider_errors(message));
        self
    }

    /// Answer the record lookup with `success: false`
    pub fn rejecting_records(mut self, message: &str) -> Self {
        self.reject_records = Some(provider_errors(message));
        self
    }

    /// Answer the update with `success: false`
    pub fn rejecting_updates(mut self, message: &str) -> Self {
        self.reject_update = Some(provider_errors(message));
        self
    }

    pub fn zone_calls(&self) -> usize {
        self.zone_calls.load(Ordering::SeqCst)
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    /// Current content of the record with `id`
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, name: &str) -> Result<Zone> {
        self.zone_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(errors) = &self.reject_zones {
            return Err(ReconcileError::rejected(Step::ZoneLookup, errors.clone()));
        }
        self.zones
            .iter()
            .find(|z| z.name == name)
            .cloned()
            .ok_or_else(|| ReconcileError::ZoneNotFound(name.to_string()))
    }

    async fn resolve_record(&self, _zone_id: &str, hostname: &str) -> Result<DnsRecord> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(errors) = &self.reject_records {
            return Err(ReconcileError::rejected(Step::RecordLookup, errors.clone()));
        }
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == hostname && r.record_type == "A")
            .cloned()
            .ok_or_else(|| ReconcileError::RecordNotFound(hostname.to_string()))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        hostname: &str,
        content: Ipv4Addr,
    ) -> Result<()> {
        self.updates.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            hostname: hostname.to_string(),
            content,
            ttl: RECORD_TTL,
        });
        if let Some(errors) = &self.reject_update {
            return Err(ReconcileError::UpdateFailed(errors.clone()));
        }
        if let Some(record) = self
            .records
            .lock()
            .unwrap()
            .iter_mut()
            .find(|r| r.id == record_id)
        {
            record.content = content.to_string();
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub fn provider_errors(message: &str) -> ProviderErrors {
    ProviderErrors(vec![ProviderMessage {
        code: Some(1000),
        message: message.to_string(),
    }])
}

pub fn zone(id: &str, name: &str) -> Zone {
    Zone {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type: "A".to_string(),
        name: name.to_string(),
        content: content.to_string(),
        ttl: RECORD_TTL,
    }
}

/// Config used by the end-to-end scenarios
pub fn home_config() -> Config {
    Config::new("t", "home.example.com").expect("valid config")
}

/// Provider with zone z1 = example.com and record r1 = home.example.com
pub fn home_provider(current_content: &str) -> MockDnsProvider {
    MockDnsProvider::new(
        vec![zone("z0", "other.org"), zone("z1", "example.com")],
        vec![a_record("r1", "home.example.com", current_content)],
    )
}

pub fn reconciler(source: &ScriptedAddressSource, provider: &MockDnsProvider) -> Reconciler {
    Reconciler::new(
        home_config(),
        Box::new(source.clone()),
        Box::new(provider.clone()),
    )
}
