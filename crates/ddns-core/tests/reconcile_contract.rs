//! Contract Test: Single Reconciliation Attempt
//!
//! Constraints verified:
//! - An unchanged address issues no update
//! - A changed address issues exactly one update with the fixed TTL
//! - Every failing step stops the attempt before the next network call
//! - Only A records for the configured hostname are considered

mod common;

use common::*;
use ddns_core::{Outcome, ReconcileError, Step, RECORD_TTL};
use std::net::Ipv4Addr;

#[tokio::test]
async fn unchanged_address_issues_no_update() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = home_provider("1.2.3.4");

    let outcome = reconciler(&source, &provider).reconcile().await.unwrap();

    assert_eq!(outcome, Outcome::Unchanged(Ipv4Addr::new(1, 2, 3, 4)));
    assert_eq!(provider.zone_calls(), 1);
    assert_eq!(provider.record_calls(), 1);
    assert!(provider.updates().is_empty(), "no PUT expected");
}

#[tokio::test]
async fn changed_address_issues_exactly_one_update() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(5, 6, 7, 8));
    let provider = home_provider("1.2.3.4");

    let outcome = reconciler(&source, &provider).reconcile().await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Updated {
            from: "1.2.3.4".to_string(),
            to: Ipv4Addr::new(5, 6, 7, 8),
        }
    );
    assert_eq!(
        provider.updates(),
        vec![UpdateCall {
            zone_id: "z1".to_string(),
            record_id: "r1".to_string(),
            hostname: "home.example.com".to_string(),
            content: Ipv4Addr::new(5, 6, 7, 8),
            ttl: RECORD_TTL,
        }]
    );
    assert_eq!(RECORD_TTL, 300);
}

#[tokio::test]
async fn second_attempt_after_update_is_unchanged() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(5, 6, 7, 8));
    let provider = home_provider("1.2.3.4");
    let reconciler = reconciler(&source, &provider);

    reconciler.reconcile().await.unwrap();
    let outcome = reconciler.reconcile().await.unwrap();

    assert_eq!(outcome, Outcome::Unchanged(Ipv4Addr::new(5, 6, 7, 8)));
    assert_eq!(provider.updates().len(), 1);
    assert_eq!(provider.content_of("r1").as_deref(), Some("5.6.7.8"));
    // Remote state is re-read every attempt
    assert_eq!(provider.zone_calls(), 2);
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn missing_zone_stops_before_record_lookup() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = MockDnsProvider::new(
        vec![],
        vec![a_record("r1", "home.example.com", "9.9.9.9")],
    );

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    assert!(
        matches!(&err, ReconcileError::ZoneNotFound(root) if root == "example.com"),
        "unexpected error: {err}"
    );
    assert_eq!(err.step(), Step::ZoneLookup);
    assert_eq!(provider.record_calls(), 0);
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn rejected_zone_lookup_stops_before_record_lookup() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = home_provider("9.9.9.9").rejecting_zones("Invalid access token");

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    match err {
        ReconcileError::ProviderRejected { step, errors } => {
            assert_eq!(step, Step::ZoneLookup);
            assert_eq!(errors.messages()[0].message, "Invalid access token");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(provider.record_calls(), 0);
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn missing_record_is_never_created() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = MockDnsProvider::new(
        vec![zone("z1", "example.com")],
        vec![a_record("r9", "other.example.com", "1.1.1.1")],
    );

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    assert!(
        matches!(&err, ReconcileError::RecordNotFound(host) if host == "home.example.com"),
        "unexpected error: {err}"
    );
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn rejected_record_lookup_issues_no_update() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = home_provider("9.9.9.9").rejecting_records("rate limited");

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::ProviderRejected {
            step: Step::RecordLookup,
            ..
        }
    ));
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn rejected_update_reports_update_failed() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(5, 6, 7, 8));
    let provider = home_provider("1.2.3.4").rejecting_updates("record locked");

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    assert!(matches!(err, ReconcileError::UpdateFailed(_)));
    assert_eq!(err.step(), Step::RecordUpdate);
    assert_eq!(provider.updates().len(), 1);
    assert_eq!(provider.content_of("r1").as_deref(), Some("1.2.3.4"));
}

#[tokio::test]
async fn failed_discovery_makes_no_provider_calls() {
    let source = ScriptedAddressSource::failing();
    let provider = home_provider("1.2.3.4");

    let err = reconciler(&source, &provider).reconcile().await.unwrap_err();

    assert!(matches!(err, ReconcileError::AddressDiscoveryFailed(_)));
    assert_eq!(provider.zone_calls(), 0);
    assert_eq!(provider.record_calls(), 0);
    assert!(provider.updates().is_empty());
}

#[tokio::test]
async fn malformed_record_content_is_overwritten() {
    let source = ScriptedAddressSource::fixed(Ipv4Addr::new(1, 2, 3, 4));
    let provider = home_provider("garbage");

    let outcome = reconciler(&source, &provider).reconcile().await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Updated {
            from: "garbage".to_string(),
            to: Ipv4Addr::new(1, 2, 3, 4),
        }
    );
}
