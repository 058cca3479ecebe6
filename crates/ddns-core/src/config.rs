//! Configuration types for the DDNS system
//!
//! The configuration is loaded once at process start and passed into the
//! [`Reconciler`](crate::Reconciler); nothing below the entry point reads the
//! environment.

use crate::error::{ReconcileError, Result};
use std::fmt;

/// Environment variable holding the Cloudflare API token
pub const API_TOKEN_VAR: &str = "CF_API_TOKEN";

/// Environment variable holding the hostname to manage
pub const HOSTNAME_VAR: &str = "DOMAIN";

/// Reconciliation configuration
///
/// Immutable once built. Both fields are guaranteed non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Provider bearer credential
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Fully-qualified hostname whose A record is managed
    hostname: String,
}

impl Config {
    /// Build a configuration from explicit values
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` naming the variable of the first empty or
    /// whitespace-only value. Non-blank values are kept exactly as given.
    pub fn new(api_token: impl Into<String>, hostname: impl Into<String>) -> Result<Self> {
        let api_token: String = api_token.into();
        let hostname: String = hostname.into();

        if api_token.trim().is_empty() {
            return Err(ReconcileError::ConfigMissing(API_TOKEN_VAR));
        }
        if hostname.trim().is_empty() {
            return Err(ReconcileError::ConfigMissing(HOSTNAME_VAR));
        }

        Ok(Self {
            api_token,
            hostname,
        })
    }

    /// Load the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(API_TOKEN_VAR).unwrap_or_default();
        let hostname = lookup(HOSTNAME_VAR).unwrap_or_default();
        Self::new(api_token, hostname)
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<REDACTED>")
            .field("hostname", &self.hostname)
            .finish()
    }
}
