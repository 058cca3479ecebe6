//! Error types for the DDNS system
//!
//! Every failure of a reconciliation attempt maps to one [`ReconcileError`]
//! variant so callers can branch on the category instead of the message.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Step of a reconciliation attempt
///
/// Attempts move through these steps in order; an error always belongs to
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Loading configuration, before any attempt runs
    Startup,
    /// Fetching the public IPv4 address
    AddressDiscovery,
    /// Looking up the zone for the root domain
    ZoneLookup,
    /// Looking up the A record for the hostname
    RecordLookup,
    /// Writing the new address to the record
    RecordUpdate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Startup => "startup",
            Step::AddressDiscovery => "address discovery",
            Step::ZoneLookup => "zone lookup",
            Step::RecordLookup => "record lookup",
            Step::RecordUpdate => "record update",
        };
        f.write_str(name)
    }
}

/// One entry of a provider's `errors` array
///
/// Decoding never fails: a `code` that is not an integer is dropped, a bare
/// string becomes the message, and any other shape yields an empty entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMessage")]
pub struct ProviderMessage {
    /// Provider error code, when one is given
    pub code: Option<i64>,
    /// Human-readable message
    pub message: String,
}

/// Any JSON scalar a provider might put in an error field
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Int(i64),
    Text(String),
    Other(IgnoredAny),
}

impl RawScalar {
    fn into_code(self) -> Option<i64> {
        match self {
            RawScalar::Int(code) => Some(code),
            RawScalar::Text(text) => text.trim().parse().ok(),
            RawScalar::Other(_) => None,
        }
    }

    fn into_text(self) -> String {
        match self {
            RawScalar::Int(value) => value.to_string(),
            RawScalar::Text(text) => text,
            RawScalar::Other(_) => String::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    Entry {
        #[serde(default)]
        code: Option<RawScalar>,
        #[serde(default)]
        message: Option<RawScalar>,
    },
    Text(String),
    Other(IgnoredAny),
}

impl From<RawMessage> for ProviderMessage {
    fn from(raw: RawMessage) -> Self {
        match raw {
            RawMessage::Entry { code, message } => Self {
                code: code.and_then(RawScalar::into_code),
                message: message.map(RawScalar::into_text).unwrap_or_default(),
            },
            RawMessage::Text(message) => Self {
                code: None,
                message,
            },
            RawMessage::Other(_) => Self {
                code: None,
                message: String::new(),
            },
        }
    }
}

impl fmt::Display for ProviderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The provider's error payload, carried verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderErrors(pub Vec<ProviderMessage>);

impl ProviderErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[ProviderMessage] {
        &self.0
    }
}

impl From<Vec<ProviderMessage>> for ProviderErrors {
    fn from(messages: Vec<ProviderMessage>) -> Self {
        Self(messages)
    }
}

impl fmt::Display for ProviderErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("no error details");
        }
        for (i, message) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", message)?;
        }
        Ok(())
    }
}

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A required configuration value is missing or empty
    #[error("Configuration error: {0} is not set")]
    ConfigMissing(&'static str),

    /// The public address could not be determined
    #[error("Address discovery failed: {0}")]
    AddressDiscoveryFailed(String),

    /// No zone matches the root domain
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// No A record exists for the hostname
    #[error("A record not found: {0}")]
    RecordNotFound(String),

    /// A lookup returned `success: false`
    #[error("Provider rejected {step}: {errors}")]
    ProviderRejected {
        /// Lookup the provider rejected
        step: Step,
        /// Provider error payload
        errors: ProviderErrors,
    },

    /// The update returned `success: false`
    #[error("Record update failed: {0}")]
    UpdateFailed(ProviderErrors),

    /// Timeout, connection failure or undecodable response on a provider call
    #[error("Transport error during {step}: {message}")]
    Transport {
        /// Step the call belonged to
        step: Step,
        /// Underlying error text
        message: String,
    },
}

impl ReconcileError {
    /// Create an address discovery error
    pub fn address(msg: impl Into<String>) -> Self {
        Self::AddressDiscoveryFailed(msg.into())
    }

    /// Create a transport error for the given step
    pub fn transport(step: Step, msg: impl Into<String>) -> Self {
        Self::Transport {
            step,
            message: msg.into(),
        }
    }

    /// Create a provider rejection for the given lookup
    pub fn rejected(step: Step, errors: impl Into<ProviderErrors>) -> Self {
        Self::ProviderRejected {
            step,
            errors: errors.into(),
        }
    }

    /// The step at which this error occurred
    pub fn step(&self) -> Step {
        match self {
            Self::ConfigMissing(_) => Step::Startup,
            Self::AddressDiscoveryFailed(_) => Step::AddressDiscovery,
            Self::ZoneNotFound(_) => Step::ZoneLookup,
            Self::RecordNotFound(_) => Step::RecordLookup,
            Self::ProviderRejected { step, .. } => *step,
            Self::UpdateFailed(_) => Step::RecordUpdate,
            Self::Transport { step, .. } => *step,
        }
    }

    /// Whether the error must stop the process
    ///
    /// Only configuration errors are fatal; everything else ends the current
    /// attempt only.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigMissing(_))
    }
}
