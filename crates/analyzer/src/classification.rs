//! Provider classification: usage bands and category tags

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Usage band derived from the share of subscriptions registering a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageBand {
    WidelyUsed,
    Common,
    Moderate,
    Specialized,
}

impl UsageBand {
    /// Thresholds are inclusive on the upper band: 80.0 is widely used
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 80.0 => UsageBand::WidelyUsed,
            p if p >= 50.0 => UsageBand::Common,
            p if p >= 20.0 => UsageBand::Moderate,
            _ => UsageBand::Specialized,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UsageBand::WidelyUsed => "widely-used",
            UsageBand::Common => "common",
            UsageBand::Moderate => "moderate",
            UsageBand::Specialized => "specialized",
        }
    }
}

impl fmt::Display for UsageBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category tag attached to a provider
///
/// Tags are independent of each other. `Other` is present exactly when no
/// baseline tier lists the provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderTag {
    AutoRegistered,
    Deprecated,
    Tier(String),
    Other,
}

impl ProviderTag {
    /// Machine-friendly kind, stable across tier names
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderTag::AutoRegistered => "auto-registered",
            ProviderTag::Deprecated => "deprecated",
            ProviderTag::Tier(_) => "tier",
            ProviderTag::Other => "other",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderTag::AutoRegistered => write!(f, "Auto-registered"),
            ProviderTag::Deprecated => write!(f, "Deprecated"),
            ProviderTag::Tier(name) => write!(f, "{}", name),
            ProviderTag::Other => write!(f, "Other"),
        }
    }
}

// Rendered as {kind, label} so templates can style by kind and print the label.
impl Serialize for ProviderTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProviderTag", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("label", &self.to_string())?;
        state.end()
    }
}

/// Classified, read-only view of one provider across the tenant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub namespace: String,
    /// Subscriptions with this provider registered
    pub registered_count: usize,
    /// Registered subscriptions that hold at least one resource of this provider
    pub subscriptions_with_resources: usize,
    pub total_resources: u64,
    /// Share of ingested subscriptions with the provider registered, two decimals
    pub percentage: f64,
    pub is_control_plane: bool,
    pub band: UsageBand,
    pub tags: BTreeSet<ProviderTag>,
    /// Subscription ids where the provider is registered, sorted
    pub subscription_ids: Vec<String>,
}

impl ProviderSummary {
    pub fn has_tag(&self, tag: &ProviderTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_data_plane(&self) -> bool {
        !self.is_control_plane
    }

    /// Tier names in tag order
    pub fn tier_names(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter_map(|tag| match tag {
                ProviderTag::Tier(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}
