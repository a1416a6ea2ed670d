//! Report rendering for Azure Provider Report
//!
//! This crate turns an analyzed [`TenantReport`] into a self-contained HTML
//! document and, optionally, a JSON export of the same dataset.

mod templates;

use azure_provider_report_analyzer::TenantReport;
use azure_provider_report_common::{CollectionFailure, ReportError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::{debug, info};

/// File name prefix shared by the HTML and JSON outputs
pub const FILE_PREFIX: &str = "azure-provider-report";

/// Everything a single report render needs
#[derive(Debug, Serialize)]
pub struct ReportContext<'a> {
    pub title: String,
    /// Human-readable generation time
    pub generated_at: String,
    /// Where the data came from (tenant endpoint or snapshot path)
    pub source: String,
    pub include_unregistered: bool,
    /// Tier names present among the providers, for the tag filter
    pub tiers: Vec<String>,
    pub report: &'a TenantReport,
    pub failures: &'a [CollectionFailure],
    #[serde(skip)]
    file_stem: String,
}

impl<'a> ReportContext<'a> {
    pub fn new(title: &str, report: &'a TenantReport, failures: &'a [CollectionFailure]) -> Self {
        Self::at(title, report, failures, Utc::now())
    }

    /// Build a context stamped with a fixed time
    pub fn at(
        title: &str,
        report: &'a TenantReport,
        failures: &'a [CollectionFailure],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let tiers: BTreeSet<String> = report
            .providers
            .iter()
            .flat_map(|p| p.tier_names())
            .map(str::to_string)
            .collect();

        Self {
            title: title.to_string(),
            generated_at: timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            source: String::new(),
            include_unregistered: false,
            tiers: tiers.into_iter().collect(),
            report,
            failures,
            file_stem: format!("{}-{}", FILE_PREFIX, timestamp.format("%Y%m%d-%H%M%S")),
        }
    }

    /// Set the data source shown in the report header (builder style)
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Mark that non-registered providers were kept (builder style)
    pub fn with_unregistered(mut self, include: bool) -> Self {
        self.include_unregistered = include;
        self
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }
}

/// Report generator
///
/// Holds the loaded templates; one generator can render any number of
/// reports.
pub struct ReportGenerator {
    tera: Tera,
}

impl ReportGenerator {
    /// Create a new report generator with the embedded templates
    pub fn new() -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { tera })
    }

    /// Render the HTML report to a string
    pub fn render(&self, ctx: &ReportContext<'_>) -> Result<String> {
        let context = Context::from_serialize(ctx)
            .map_err(|e| ReportError::Render(format!("Failed to build context: {:?}", e)))?;

        self.tera
            .render("report.html", &context)
            .map_err(|e| ReportError::Render(format!("Template error: {:?}", e)))
    }

    /// Render the HTML report into `output_dir`, returning the written path
    pub fn write_to_directory(&self, output_dir: &Path, ctx: &ReportContext<'_>) -> Result<PathBuf> {
        let rendered = self.render(ctx)?;
        let output_path = output_path(output_dir, ctx, "html")?;

        fs::write(&output_path, rendered).map_err(|e| {
            ReportError::Render(format!(
                "Failed to write {}: {}",
                output_path.display(),
                e
            ))
        })?;

        info!(path = %output_path.display(), "HTML report written");
        Ok(output_path)
    }

    /// Write the report dataset as pretty JSON next to the HTML report
    pub fn write_json(&self, output_dir: &Path, ctx: &ReportContext<'_>) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(ctx)?;
        let output_path = output_path(output_dir, ctx, "json")?;

        fs::write(&output_path, json).map_err(|e| {
            ReportError::Render(format!(
                "Failed to write {}: {}",
                output_path.display(),
                e
            ))
        })?;

        info!(path = %output_path.display(), "JSON export written");
        Ok(output_path)
    }
}

fn output_path(output_dir: &Path, ctx: &ReportContext<'_>, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).map_err(|e| {
        ReportError::Render(format!(
            "Failed to create output directory {}: {}",
            output_dir.display(),
            e
        ))
    })?;

    let path = output_dir.join(format!("{}.{}", ctx.file_stem(), extension));
    debug!(path = %path.display(), "Resolved output path");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn empty_report() -> TenantReport {
        TenantReport {
            statistics: Default::default(),
            providers: vec![],
            subscriptions: vec![],
            required_compliance: None,
            recommended_compliance: None,
        }
    }

    #[test]
    fn test_file_stem_uses_timestamp() {
        let report = empty_report();
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let ctx = ReportContext::at("Report", &report, &[], timestamp);

        assert_eq!(ctx.file_stem(), "azure-provider-report-20240305-140709");
        assert_eq!(ctx.generated_at, "2024-03-05 14:07:09 UTC");
    }

    #[test]
    fn test_render_empty_report() {
        let report = empty_report();
        let ctx = ReportContext::new("Empty tenant", &report, &[]);

        let html = ReportGenerator::new().unwrap().render(&ctx).unwrap();
        assert!(html.contains("<title>Empty tenant</title>"));
        assert!(html.contains("No providers are registered"));
    }
}
