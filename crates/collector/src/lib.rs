//! Collection of resource provider data from Azure Resource Manager
//!
//! This crate produces one [`SubscriptionFeed`] per subscription: the provider
//! list with registration states and the resource count per provider
//! namespace.
//!
//! ## Sources
//!
//! - [`ArmCollector`] talks to the live ARM REST API with a bearer token
//!   obtained through [`TokenSource`].
//! - [`SnapshotCollector`] replays feeds from a JSON snapshot file.
//!
//! [`collect_tenant`] drives either source over every subscription, keeping
//! going when a single subscription fails.

pub mod arm;
mod auth;
mod snapshot;
mod tenant;

pub use arm::{ArmCollector, DEFAULT_ENDPOINT};
pub use auth::{AccessToken, TokenSource, DEFAULT_AUTHORITY};
pub use snapshot::{save_snapshot, SnapshotCollector};
pub use tenant::{collect_tenant, CollectionEvent, SubscriptionFilter, TenantCollection};

pub use azure_provider_report_common::CollectionFailure;

use azure_provider_report_common::SubscriptionFeed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while collecting
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

/// A subscription as enumerated in the tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRef {
    pub subscription_id: String,
    pub display_name: String,
    /// ARM subscription state (e.g., "Enabled", "Disabled"), when known
    #[serde(default)]
    pub state: Option<String>,
}

impl SubscriptionRef {
    pub fn new(subscription_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            display_name: display_name.into(),
            state: None,
        }
    }
}

/// Source of per-subscription provider data
#[cfg_attr(test, mockall::automock)]
pub trait Collector {
    /// Enumerate every subscription visible in the tenant
    fn list_subscriptions(&self) -> Result<Vec<SubscriptionRef>>;

    /// Gather providers and resource counts for one subscription
    fn collect(&self, subscription: &SubscriptionRef) -> Result<SubscriptionFeed>;
}

/// Count resources per provider namespace
///
/// The namespace of a resource type is everything before the first `/`,
/// compared case-sensitively. A type without `/` is its own namespace.
pub fn resource_counts<'a, I>(resource_types: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();

    for resource_type in resource_types {
        let namespace = resource_type.split('/').next().unwrap_or(resource_type);
        if namespace.is_empty() {
            continue;
        }
        *counts.entry(namespace.to_string()).or_insert(0) += 1;
    }

    counts
}
