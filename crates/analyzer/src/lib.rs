//! Provider aggregation and classification for Azure Provider Report
//!
//! Turns per-subscription collector feeds into a tenant-wide usage matrix,
//! classified provider summaries, per-subscription summaries and compliance
//! results against the baseline catalog.
//!
//! # Examples
//!
//! ```
//! use azure_provider_report_analyzer::Aggregator;
//! use azure_provider_report_common::{BaselineCatalog, RegistrationState, SubscriptionFeed};
//!
//! let catalog = BaselineCatalog::builtin().expect("built-in catalog");
//! let mut aggregator = Aggregator::new(&catalog);
//!
//! aggregator.ingest(
//!     &SubscriptionFeed::new("00000000-0000-0000-0000-000000000001", "Production")
//!         .with_provider("Microsoft.KeyVault", RegistrationState::Registered)
//!         .with_resources("Microsoft.KeyVault", 2),
//! );
//!
//! let providers = aggregator.classify();
//! assert_eq!(providers[0].namespace, "Microsoft.KeyVault");
//! assert_eq!(providers[0].percentage, 100.0);
//! ```

mod aggregator;
mod classification;
mod compliance;
mod report;

pub use aggregator::{Aggregator, SubscriptionSummary, UsageMatrixEntry};
pub use classification::{ProviderSummary, ProviderTag, UsageBand};
pub use compliance::ComplianceResult;
pub use report::{TenantReport, TenantStatistics};

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Compliance requires a non-empty provider list")]
    EmptyRequiredList,
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Round a value to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
