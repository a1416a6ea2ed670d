//! Tenant-wide aggregation of provider registrations

use crate::classification::{ProviderSummary, ProviderTag, UsageBand};
use crate::compliance::ComplianceResult;
use crate::{round_to, AnalyzerError, Result};
use azure_provider_report_common::{BaselineCatalog, ProviderState, SubscriptionFeed};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Accumulated usage of one provider namespace across the tenant
///
/// Invariants: `subscriptions_with_resources <= registered_count` and
/// `total_resources >= subscriptions_with_resources`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageMatrixEntry {
    pub registered_count: usize,
    pub subscriptions_with_resources: usize,
    pub total_resources: u64,
    pub subscription_ids: BTreeSet<String>,
}

/// Per-subscription view used by the drill-down section of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionSummary {
    pub subscription_id: String,
    pub subscription_name: String,
    pub registered_provider_count: usize,
    /// Distinct listed providers with at least one resource in the subscription
    pub providers_with_resources_count: usize,
    /// All resources in the subscription, irrespective of provider
    pub total_resource_count: u64,
    /// Sorted ascending
    pub registered_namespaces: Vec<String>,
    /// Providers in any other state, sorted by namespace. Only filled when
    /// the aggregator was asked to keep them; never used by aggregates.
    pub other_providers: Vec<ProviderState>,
}

/// Aggregator/classifier over collector feeds
///
/// Feeds are ingested one subscription at a time; derived views
/// ([`classify`](Self::classify), [`compute_compliance`](Self::compute_compliance))
/// are meant to be read once ingestion is complete.
pub struct Aggregator<'a> {
    catalog: &'a BaselineCatalog,
    include_unregistered: bool,
    matrix: BTreeMap<String, UsageMatrixEntry>,
    subscriptions: Vec<SubscriptionSummary>,
}

impl<'a> Aggregator<'a> {
    pub fn new(catalog: &'a BaselineCatalog) -> Self {
        Self {
            catalog,
            include_unregistered: false,
            matrix: BTreeMap::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Keep non-registered providers in the subscription drill-down
    pub fn include_unregistered(mut self, include: bool) -> Self {
        self.include_unregistered = include;
        self
    }

    pub fn catalog(&self) -> &BaselineCatalog {
        self.catalog
    }

    /// Fold one subscription's feed into the usage matrix
    ///
    /// A subscription id that was already ingested is ignored, so a repeated
    /// feed never inflates the subscription count.
    pub fn ingest(&mut self, feed: &SubscriptionFeed) {
        if self
            .subscriptions
            .iter()
            .any(|s| s.subscription_id == feed.subscription_id)
        {
            warn!(
                subscription = %feed.subscription_id,
                "Subscription already ingested, ignoring repeated feed"
            );
            return;
        }

        let mut registered_namespaces = Vec::new();
        let mut other_providers = Vec::new();
        let mut with_resources = BTreeSet::new();

        for registration in feed.registrations() {
            if registration.namespace.is_empty() {
                warn!(
                    subscription = %feed.subscription_id,
                    "Skipping provider registration with empty namespace"
                );
                continue;
            }

            if registration.resource_count > 0 {
                with_resources.insert(registration.namespace.clone());
            }

            if !registration.registration_state.is_registered() {
                if self.include_unregistered {
                    other_providers.push(ProviderState::new(
                        registration.namespace,
                        registration.registration_state,
                    ));
                }
                continue;
            }

            let entry = self
                .matrix
                .entry(registration.namespace.clone())
                .or_default();

            if !entry.subscription_ids.insert(feed.subscription_id.clone()) {
                debug!(
                    subscription = %feed.subscription_id,
                    namespace = %registration.namespace,
                    "Duplicate registration ignored"
                );
                continue;
            }

            entry.registered_count += 1;
            if registration.resource_count > 0 {
                entry.subscriptions_with_resources += 1;
                entry.total_resources += registration.resource_count;
            }

            registered_namespaces.push(registration.namespace);
        }

        registered_namespaces.sort();
        other_providers.sort_by(|a, b| a.namespace.cmp(&b.namespace));

        let summary = SubscriptionSummary {
            subscription_id: feed.subscription_id.clone(),
            subscription_name: feed.subscription_name.clone(),
            registered_provider_count: registered_namespaces.len(),
            providers_with_resources_count: with_resources.len(),
            total_resource_count: feed.total_resources(),
            registered_namespaces,
            other_providers,
        };

        debug!(
            subscription = %summary.subscription_id,
            registered = summary.registered_provider_count,
            resources = summary.total_resource_count,
            "Ingested subscription"
        );

        self.subscriptions.push(summary);
    }

    /// Number of subscriptions ingested so far
    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Usage entry for a namespace, if registered anywhere
    pub fn usage(&self, namespace: &str) -> Option<&UsageMatrixEntry> {
        self.matrix.get(namespace)
    }

    /// Subscription summaries in ingestion order
    pub fn subscriptions(&self) -> &[SubscriptionSummary] {
        &self.subscriptions
    }

    /// Classify every provider registered in at least one subscription
    ///
    /// Sorted by descending registered count, then namespace ascending.
    pub fn classify(&self) -> Vec<ProviderSummary> {
        let total = self.total_subscriptions();

        let mut summaries: Vec<ProviderSummary> = self
            .matrix
            .iter()
            .filter(|(_, entry)| entry.registered_count > 0)
            .map(|(namespace, entry)| self.summarize(namespace, entry, total))
            .collect();

        summaries.sort_by(|a, b| {
            b.registered_count
                .cmp(&a.registered_count)
                .then_with(|| a.namespace.cmp(&b.namespace))
        });

        summaries
    }

    fn summarize(&self, namespace: &str, entry: &UsageMatrixEntry, total: usize) -> ProviderSummary {
        let percentage = round_to(entry.registered_count as f64 / total as f64 * 100.0, 2);

        let mut tags = BTreeSet::new();
        if self.catalog.is_auto_registered(namespace) {
            tags.insert(ProviderTag::AutoRegistered);
        }
        if self.catalog.is_deprecated(namespace) {
            tags.insert(ProviderTag::Deprecated);
        }

        let tiers = self.catalog.tiers_for(namespace);
        if tiers.is_empty() {
            tags.insert(ProviderTag::Other);
        } else {
            tags.extend(tiers.into_iter().map(|tier| ProviderTag::Tier(tier.to_string())));
        }

        ProviderSummary {
            namespace: namespace.to_string(),
            registered_count: entry.registered_count,
            subscriptions_with_resources: entry.subscriptions_with_resources,
            total_resources: entry.total_resources,
            percentage,
            is_control_plane: entry.subscriptions_with_resources == 0,
            band: UsageBand::from_percentage(percentage),
            tags,
            subscription_ids: entry.subscription_ids.iter().cloned().collect(),
        }
    }

    /// Tenant-level check of a provider list
    ///
    /// A provider counts as found when it is registered in at least one
    /// subscription.
    pub fn compute_compliance(&self, required: &[String]) -> Result<ComplianceResult> {
        if required.is_empty() {
            return Err(AnalyzerError::EmptyRequiredList);
        }

        let (found, missing): (Vec<String>, Vec<String>) = required
            .iter()
            .cloned()
            .partition(|namespace| self.matrix.contains_key(namespace));

        Ok(ComplianceResult::new(required.len(), found, missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azure_provider_report_common::RegistrationState;

    fn catalog() -> BaselineCatalog {
        BaselineCatalog::from_yaml(
            r#"
version: 1
auto_registered: [Microsoft.Authorization]
deprecated: [Microsoft.ClassicCompute]
required: [Microsoft.Network]
tiers:
  - name: Platform Connectivity
    providers: [Microsoft.Network]
  - name: Landing Zone Public
    providers: [Microsoft.Network, Microsoft.Web]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ingest_counts_only_registered() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Network", RegistrationState::Registered)
                .with_provider("Microsoft.Web", RegistrationState::NotRegistered)
                .with_provider("Microsoft.Sql", RegistrationState::Registering)
                .with_resources("Microsoft.Network", 3)
                .with_resources("Microsoft.Web", 1),
        );

        let network = aggregator.usage("Microsoft.Network").unwrap();
        assert_eq!(network.registered_count, 1);
        assert_eq!(network.subscriptions_with_resources, 1);
        assert_eq!(network.total_resources, 3);
        assert!(aggregator.usage("Microsoft.Web").is_none());
        assert!(aggregator.usage("Microsoft.Sql").is_none());

        let summary = &aggregator.subscriptions()[0];
        assert_eq!(summary.registered_provider_count, 1);
        assert_eq!(summary.providers_with_resources_count, 2);
        assert_eq!(summary.total_resource_count, 4);
        assert!(summary.other_providers.is_empty());
    }

    #[test]
    fn test_include_unregistered_keeps_drill_down_only() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog).include_unregistered(true);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Web", RegistrationState::NotRegistered)
                .with_provider("Microsoft.Cdn", RegistrationState::Unregistering),
        );

        let summary = &aggregator.subscriptions()[0];
        assert_eq!(summary.registered_provider_count, 0);
        assert_eq!(
            summary.other_providers,
            vec![
                ProviderState::new("Microsoft.Cdn", RegistrationState::Unregistering),
                ProviderState::new("Microsoft.Web", RegistrationState::NotRegistered),
            ]
        );
        assert!(aggregator.classify().is_empty());
    }

    #[test]
    fn test_registered_namespaces_sorted() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Web", RegistrationState::Registered)
                .with_provider("Microsoft.Authorization", RegistrationState::Registered)
                .with_provider("Microsoft.Network", RegistrationState::Registered),
        );

        assert_eq!(
            aggregator.subscriptions()[0].registered_namespaces,
            vec!["Microsoft.Authorization", "Microsoft.Network", "Microsoft.Web"]
        );
    }

    #[test]
    fn test_empty_namespace_skipped() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("", RegistrationState::Registered)
                .with_provider("Microsoft.Network", RegistrationState::Registered),
        );

        assert_eq!(aggregator.classify().len(), 1);
        assert_eq!(aggregator.subscriptions()[0].registered_provider_count, 1);
    }

    #[test]
    fn test_duplicate_registration_counted_once() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Network", RegistrationState::Registered)
                .with_provider("Microsoft.Network", RegistrationState::Registered)
                .with_resources("Microsoft.Network", 2),
        );

        let network = aggregator.usage("Microsoft.Network").unwrap();
        assert_eq!(network.registered_count, 1);
        assert_eq!(network.total_resources, 2);
    }

    #[test]
    fn test_repeated_subscription_ingested_once() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);
        let feed = SubscriptionFeed::new("sub-a", "A")
            .with_provider("Microsoft.Web", RegistrationState::Registered);

        aggregator.ingest(&feed);
        aggregator.ingest(&feed);

        assert_eq!(aggregator.total_subscriptions(), 1);
        assert_eq!(aggregator.subscriptions().len(), 1);

        let providers = aggregator.classify();
        assert_eq!(providers[0].registered_count, 1);
        assert_eq!(providers[0].percentage, 100.0);
        assert_eq!(providers[0].band, UsageBand::WidelyUsed);
    }

    #[test]
    fn test_unmatched_resource_prefix_not_a_provider_with_resources() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Insights", RegistrationState::Registered)
                .with_resources("microsoft.insights", 3),
        );

        let summary = &aggregator.subscriptions()[0];
        assert_eq!(summary.providers_with_resources_count, 0);
        // Still counted irrespective of provider
        assert_eq!(summary.total_resource_count, 3);

        let providers = aggregator.classify();
        assert!(providers[0].is_control_plane);
        assert_eq!(providers[0].subscriptions_with_resources, 0);
    }

    #[test]
    fn test_tier_tags_and_other() {
        let catalog = catalog();
        let mut aggregator = Aggregator::new(&catalog);

        aggregator.ingest(
            &SubscriptionFeed::new("sub-a", "A")
                .with_provider("Microsoft.Network", RegistrationState::Registered)
                .with_provider("Microsoft.Sql", RegistrationState::Registered)
                .with_provider("Microsoft.ClassicCompute", RegistrationState::Registered),
        );

        let providers = aggregator.classify();
        let network = providers
            .iter()
            .find(|p| p.namespace == "Microsoft.Network")
            .unwrap();
        assert_eq!(
            network.tier_names(),
            vec!["Landing Zone Public", "Platform Connectivity"]
        );
        assert!(!network.has_tag(&ProviderTag::Other));

        let sql = providers.iter().find(|p| p.namespace == "Microsoft.Sql").unwrap();
        assert_eq!(sql.tags.len(), 1);
        assert!(sql.has_tag(&ProviderTag::Other));

        let classic = providers
            .iter()
            .find(|p| p.namespace == "Microsoft.ClassicCompute")
            .unwrap();
        assert!(classic.has_tag(&ProviderTag::Deprecated));
        assert!(classic.has_tag(&ProviderTag::Other));
    }

    #[test]
    fn test_compliance_rejects_empty_list() {
        let catalog = catalog();
        let aggregator = Aggregator::new(&catalog);

        assert!(matches!(
            aggregator.compute_compliance(&[]),
            Err(AnalyzerError::EmptyRequiredList)
        ));
    }
}
