//! Report-ready bundle of everything the analyzer derives

use crate::aggregator::{Aggregator, SubscriptionSummary};
use crate::classification::{ProviderSummary, ProviderTag, UsageBand};
use crate::compliance::ComplianceResult;
use crate::Result;
use serde::Serialize;

/// Tenant-wide headline numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenantStatistics {
    pub subscription_count: usize,
    pub distinct_providers: usize,
    pub control_plane_providers: usize,
    pub data_plane_providers: usize,
    /// (subscription, provider) pairs in Registered state
    pub registration_pairs: usize,
    pub total_resources: u64,
    pub widely_used: usize,
    pub common: usize,
    pub moderate: usize,
    pub specialized: usize,
    /// Deprecated providers still registered somewhere
    pub deprecated_registered: Vec<String>,
}

/// Complete derived dataset handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantReport {
    pub statistics: TenantStatistics,
    pub providers: Vec<ProviderSummary>,
    pub subscriptions: Vec<SubscriptionSummary>,
    /// Against the catalog's required list; absent when that list is empty
    pub required_compliance: Option<ComplianceResult>,
    /// Against the catalog's recommended list; absent when that list is empty
    pub recommended_compliance: Option<ComplianceResult>,
}

impl TenantStatistics {
    fn from_parts(providers: &[ProviderSummary], subscriptions: &[SubscriptionSummary]) -> Self {
        let mut stats = TenantStatistics {
            subscription_count: subscriptions.len(),
            distinct_providers: providers.len(),
            total_resources: subscriptions.iter().map(|s| s.total_resource_count).sum(),
            ..Default::default()
        };

        for provider in providers {
            if provider.is_data_plane() {
                stats.data_plane_providers += 1;
            } else {
                stats.control_plane_providers += 1;
            }
            stats.registration_pairs += provider.registered_count;

            match provider.band {
                UsageBand::WidelyUsed => stats.widely_used += 1,
                UsageBand::Common => stats.common += 1,
                UsageBand::Moderate => stats.moderate += 1,
                UsageBand::Specialized => stats.specialized += 1,
            }

            if provider.has_tag(&ProviderTag::Deprecated) {
                stats.deprecated_registered.push(provider.namespace.clone());
            }
        }

        stats
    }
}

impl Aggregator<'_> {
    /// Derive the full dataset for rendering
    ///
    /// Compliance is omitted for an empty catalog list.
    pub fn build_report(&self) -> Result<TenantReport> {
        let providers = self.classify();
        let subscriptions = self.subscriptions().to_vec();
        let statistics = TenantStatistics::from_parts(&providers, &subscriptions);

        Ok(TenantReport {
            statistics,
            providers,
            subscriptions,
            required_compliance: self.baseline_compliance(&self.catalog().required)?,
            recommended_compliance: self.baseline_compliance(&self.catalog().recommended)?,
        })
    }

    fn baseline_compliance(&self, list: &[String]) -> Result<Option<ComplianceResult>> {
        (!list.is_empty())
            .then(|| self.compute_compliance(list))
            .transpose()
    }
}

impl TenantReport {
    /// Providers with the given band, in report order
    pub fn providers_in_band(&self, band: UsageBand) -> impl Iterator<Item = &ProviderSummary> {
        self.providers.iter().filter(move |p| p.band == band)
    }

    pub fn top_providers(&self, limit: usize) -> &[ProviderSummary] {
        &self.providers[..limit.min(self.providers.len())]
    }
}
