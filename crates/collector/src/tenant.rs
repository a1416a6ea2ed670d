//! Tenant-wide collection loop with the partial-result policy

use crate::{Collector, Result, SubscriptionRef};
use azure_provider_report_common::{CollectionFailure, SubscriptionFeed};
use tracing::{info, warn};

/// Result of collecting every selected subscription
#[derive(Debug, Clone, Default)]
pub struct TenantCollection {
    /// Successfully collected feeds, in enumeration order
    pub feeds: Vec<SubscriptionFeed>,
    pub failures: Vec<CollectionFailure>,
    /// Subscriptions enumerated but not selected by the filter
    pub filtered_out: usize,
}

/// Progress notifications emitted while collecting
#[derive(Debug)]
pub enum CollectionEvent<'a> {
    Started {
        index: usize,
        total: usize,
        subscription: &'a SubscriptionRef,
    },
    Collected {
        feed: &'a SubscriptionFeed,
    },
    Failed {
        failure: &'a CollectionFailure,
    },
}

/// Selects subscriptions by id or display name
///
/// Matching is case-insensitive. An empty filter selects everything.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    patterns: Vec<String>,
}

impl SubscriptionFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, subscription: &SubscriptionRef) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let id = subscription.subscription_id.to_lowercase();
        let name = subscription.display_name.to_lowercase();
        self.patterns.iter().any(|p| *p == id || *p == name)
    }
}

/// Collect every selected subscription, one at a time
///
/// Failing to enumerate subscriptions is fatal. A failure for a single
/// subscription is recorded and the loop moves on; that subscription is absent
/// from `feeds`.
pub fn collect_tenant<C, F>(
    collector: &C,
    filter: &SubscriptionFilter,
    mut on_event: F,
) -> Result<TenantCollection>
where
    C: Collector + ?Sized,
    F: FnMut(CollectionEvent<'_>),
{
    let subscriptions = collector.list_subscriptions()?;
    let enumerated = subscriptions.len();

    let selected: Vec<SubscriptionRef> = subscriptions
        .into_iter()
        .filter(|s| filter.matches(s))
        .collect();

    let mut collection = TenantCollection {
        filtered_out: enumerated - selected.len(),
        ..Default::default()
    };

    let total = selected.len();
    for (index, subscription) in selected.iter().enumerate() {
        on_event(CollectionEvent::Started {
            index,
            total,
            subscription,
        });

        match collector.collect(subscription) {
            Ok(feed) => {
                on_event(CollectionEvent::Collected { feed: &feed });
                collection.feeds.push(feed);
            }
            Err(e) => {
                warn!(
                    subscription = %subscription.subscription_id,
                    error = %e,
                    "Skipping subscription"
                );
                let failure = CollectionFailure {
                    subscription_id: subscription.subscription_id.clone(),
                    subscription_name: subscription.display_name.clone(),
                    reason: e.to_string(),
                };
                on_event(CollectionEvent::Failed { failure: &failure });
                collection.failures.push(failure);
            }
        }
    }

    info!(
        collected = collection.feeds.len(),
        failed = collection.failures.len(),
        filtered_out = collection.filtered_out,
        "Tenant collection finished"
    );

    Ok(collection)
}
