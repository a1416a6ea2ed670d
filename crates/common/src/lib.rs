//! Common types and utilities for Azure Provider Report
//!
//! This crate contains the shared data model produced by the collector and
//! consumed by the analyzer, the error type shared by the library crates, and
//! the baseline provider catalog.

pub mod baseline;

pub use baseline::{BaselineCatalog, BaselineTier};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while loading inputs or producing a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Baseline error: {0}")]
    Baseline(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Registration state of a resource provider on one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegistrationState {
    Registered,
    NotRegistered,
    Registering,
    Unregistering,
    /// Any state string ARM reports that is not one of the above
    #[serde(other)]
    Unknown,
}

impl RegistrationState {
    pub fn is_registered(self) -> bool {
        self == RegistrationState::Registered
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationState::Registered => write!(f, "Registered"),
            RegistrationState::NotRegistered => write!(f, "NotRegistered"),
            RegistrationState::Registering => write!(f, "Registering"),
            RegistrationState::Unregistering => write!(f, "Unregistering"),
            RegistrationState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A provider namespace together with its registration state, as listed by ARM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    /// Provider namespace (e.g., "Microsoft.KeyVault")
    pub namespace: String,
    /// Registration state on the subscription
    pub registration_state: RegistrationState,
}

impl ProviderState {
    pub fn new(namespace: impl Into<String>, registration_state: RegistrationState) -> Self {
        Self {
            namespace: namespace.into(),
            registration_state,
        }
    }
}

/// One (subscription, provider) fact for a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRegistration {
    pub subscription_id: String,
    pub namespace: String,
    pub registration_state: RegistrationState,
    /// Number of resources in the subscription whose type belongs to this namespace
    pub resource_count: u64,
}

/// Everything the collector gathered for one subscription
///
/// This is also the record format of snapshot files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionFeed {
    pub subscription_id: String,
    pub subscription_name: String,
    /// Every provider known to the platform with its registration state
    #[serde(default)]
    pub providers: Vec<ProviderState>,
    /// Resource count per provider namespace, derived from the resource list
    #[serde(default)]
    pub resource_counts: BTreeMap<String, u64>,
}

impl SubscriptionFeed {
    pub fn new(subscription_id: impl Into<String>, subscription_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            subscription_name: subscription_name.into(),
            ..Default::default()
        }
    }

    /// Add a provider with its registration state (builder style)
    pub fn with_provider(mut self, namespace: &str, state: RegistrationState) -> Self {
        self.providers.push(ProviderState::new(namespace, state));
        self
    }

    /// Set the resource count for a namespace (builder style)
    pub fn with_resources(mut self, namespace: &str, count: u64) -> Self {
        self.resource_counts.insert(namespace.to_string(), count);
        self
    }

    /// Join the provider list with the resource counts
    ///
    /// Providers are matched against resource counts by exact namespace.
    pub fn registrations(&self) -> Vec<ProviderRegistration> {
        self.providers
            .iter()
            .map(|provider| ProviderRegistration {
                subscription_id: self.subscription_id.clone(),
                namespace: provider.namespace.clone(),
                registration_state: provider.registration_state,
                resource_count: self
                    .resource_counts
                    .get(&provider.namespace)
                    .copied()
                    .unwrap_or(0),
            })
            .collect()
    }

    /// Total resources in the subscription, irrespective of provider
    pub fn total_resources(&self) -> u64 {
        self.resource_counts.values().sum()
    }
}

/// A subscription that could not be collected and was left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFailure {
    pub subscription_id: String,
    pub subscription_name: String,
    pub reason: String,
}
