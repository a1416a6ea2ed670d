//! Snapshot files: collector feeds saved as JSON for offline runs

use crate::{Collector, CollectorError, Result, SubscriptionRef};
use azure_provider_report_common::SubscriptionFeed;
use std::fs;
use std::path::Path;

/// Collector that replays feeds from a snapshot
pub struct SnapshotCollector {
    feeds: Vec<SubscriptionFeed>,
}

impl SnapshotCollector {
    pub fn new(feeds: Vec<SubscriptionFeed>) -> Self {
        Self { feeds }
    }

    /// Load a snapshot file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            CollectorError::Snapshot(format!(
                "Failed to read snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let feeds: Vec<SubscriptionFeed> = serde_json::from_str(json)
            .map_err(|e| CollectorError::Snapshot(format!("Failed to parse snapshot JSON: {}", e)))?;

        Ok(Self::new(feeds))
    }

    pub fn feeds(&self) -> &[SubscriptionFeed] {
        &self.feeds
    }
}

impl Collector for SnapshotCollector {
    fn list_subscriptions(&self) -> Result<Vec<SubscriptionRef>> {
        Ok(self
            .feeds
            .iter()
            .map(|feed| SubscriptionRef::new(&feed.subscription_id, &feed.subscription_name))
            .collect())
    }

    fn collect(&self, subscription: &SubscriptionRef) -> Result<SubscriptionFeed> {
        self.feeds
            .iter()
            .find(|feed| feed.subscription_id == subscription.subscription_id)
            .cloned()
            .ok_or_else(|| {
                CollectorError::Snapshot(format!(
                    "Subscription {} not present in snapshot",
                    subscription.subscription_id
                ))
            })
    }
}

/// Write feeds as a pretty-printed snapshot file
pub fn save_snapshot<P: AsRef<Path>>(path: P, feeds: &[SubscriptionFeed]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(feeds)
        .map_err(|e| CollectorError::Snapshot(format!("Failed to serialize snapshot: {}", e)))?;
    fs::write(path, json)?;

    Ok(())
}
