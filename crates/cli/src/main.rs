//! Azure Provider Report CLI
//!
//! Command-line interface for analyzing resource provider registrations across
//! an Azure tenant.

use anyhow::{Context, Result};
use azure_provider_report_analyzer::{Aggregator, ComplianceResult, TenantReport};
use azure_provider_report_collector::{
    collect_tenant, save_snapshot, ArmCollector, CollectionEvent, Collector, SnapshotCollector,
    SubscriptionFilter, TenantCollection, TokenSource, DEFAULT_AUTHORITY, DEFAULT_ENDPOINT,
};
use azure_provider_report_common::BaselineCatalog;
use azure_provider_report_generator::{ReportContext, ReportGenerator};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of providers listed in the console summary
const TOP_PROVIDERS: usize = 10;

#[derive(Parser)]
#[command(name = "azure-provider-report")]
#[command(version, about = "Analyze resource provider registrations across an Azure tenant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect provider data and render the HTML report
    #[command(after_help = "EXAMPLES:\n  \
        # Report on every subscription visible to the signed-in Azure CLI user\n  \
        azure-provider-report report\n\n  \
        # Two subscriptions only, with a JSON export\n  \
        azure-provider-report report \\\n    \
        --subscription Production,Staging \\\n    \
        --json \\\n    \
        --output-dir ./out\n\n  \
        # Render offline from a saved snapshot\n  \
        azure-provider-report report --snapshot tenant.json --include-unregistered")]
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory the report is written to
        #[arg(short, long, default_value = "./reports")]
        output_dir: PathBuf,

        /// Report title
        #[arg(short, long, default_value = "Azure Resource Provider Report")]
        title: String,

        /// Also list non-registered providers per subscription
        #[arg(long)]
        include_unregistered: bool,

        /// Baseline catalog YAML (built-in catalog if not specified)
        #[arg(long, value_name = "FILE")]
        baseline: Option<PathBuf>,

        /// Also write the report dataset as JSON
        #[arg(long)]
        json: bool,

        /// Save the collected feeds as a snapshot file
        #[arg(long, value_name = "FILE", conflicts_with = "snapshot")]
        save_snapshot: Option<PathBuf>,
    },

    /// Collect provider data and save it as a snapshot, without rendering
    #[command(after_help = "EXAMPLES:\n  \
        azure-provider-report collect --output tenant.json\n\n  \
        # Later, offline\n  \
        azure-provider-report report --snapshot tenant.json")]
    Collect {
        #[command(flatten)]
        source: SourceArgs,

        /// Snapshot file to write
        #[arg(short, long, default_value = "snapshot.json")]
        output: PathBuf,
    },

    /// Print the effective baseline catalog as YAML
    Baseline {
        /// Baseline catalog YAML to validate and print (built-in if not specified)
        #[arg(long, value_name = "FILE")]
        baseline: Option<PathBuf>,
    },
}

/// Where subscription data comes from
#[derive(Args)]
struct SourceArgs {
    /// Read feeds from a snapshot file instead of querying Azure
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Only include these subscriptions (id or display name, repeatable)
    #[arg(long = "subscription", value_name = "ID_OR_NAME", value_delimiter = ',')]
    subscriptions: Vec<String>,

    /// Azure Resource Manager endpoint
    #[arg(long, env = "AZURE_RESOURCE_MANAGER_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Microsoft Entra authority host for client credentials
    #[arg(long, env = "AZURE_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY)]
    authority: String,

    /// Pre-issued ARM bearer token
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Tenant for service principal authentication
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Client id for service principal authentication
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Client secret for service principal authentication
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Report {
            source,
            output_dir,
            title,
            include_unregistered,
            baseline,
            json,
            save_snapshot,
        } => {
            report_command(ReportConfig {
                source: &source,
                output_dir: output_dir.as_path(),
                title: &title,
                include_unregistered,
                baseline: baseline.as_deref(),
                json,
                save_snapshot: save_snapshot.as_deref(),
                verbose: cli.verbose > 0,
            })?;
        }
        Commands::Collect { source, output } => {
            collect_command(&source, output.as_path())?;
        }
        Commands::Baseline { baseline } => {
            baseline_command(baseline.as_deref())?;
        }
    }

    Ok(())
}

/// Initialize tracing from `RUST_LOG`, falling back to the `-v` count
fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct ReportConfig<'a> {
    source: &'a SourceArgs,
    output_dir: &'a Path,
    title: &'a str,
    include_unregistered: bool,
    baseline: Option<&'a Path>,
    json: bool,
    save_snapshot: Option<&'a Path>,
    verbose: bool,
}

fn report_command(config: ReportConfig) -> Result<()> {
    let catalog = load_catalog(config.baseline)?;

    // Fail on an unusable output directory before spending time on collection
    fs::create_dir_all(config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let collection = collect(config.source)?;

    if let Some(path) = config.save_snapshot {
        save_snapshot(path, &collection.feeds)
            .with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
        println!("{} Snapshot saved to {}", "✓".green(), path.display());
    }

    println!(
        "{} Aggregating {} subscription(s)",
        "→".cyan(),
        collection.feeds.len()
    );
    let mut aggregator = Aggregator::new(&catalog).include_unregistered(config.include_unregistered);
    for feed in &collection.feeds {
        aggregator.ingest(feed);
    }
    let report = aggregator
        .build_report()
        .context("Failed to analyze provider registrations")?;

    let generator = ReportGenerator::new().context("Failed to load report templates")?;
    let ctx = ReportContext::new(config.title, &report, &collection.failures)
        .with_source(source_label(config.source))
        .with_unregistered(config.include_unregistered);

    let html_path = generator
        .write_to_directory(config.output_dir, &ctx)
        .context("Failed to write HTML report")?;

    println!("\n{}", "✓ Report generated!".green().bold());
    println!("  HTML: {}", html_path.display().to_string().cyan());

    if config.json {
        let json_path = generator
            .write_json(config.output_dir, &ctx)
            .context("Failed to write JSON export")?;
        println!("  JSON: {}", json_path.display().to_string().cyan());
    }

    print_summary(&report, &collection, config.verbose);

    Ok(())
}

fn collect_command(source: &SourceArgs, output: &Path) -> Result<()> {
    let collection = collect(source)?;

    save_snapshot(output, &collection.feeds)
        .with_context(|| format!("Failed to save snapshot to {}", output.display()))?;

    println!("\n{}", "✓ Collection complete!".green().bold());
    println!("  Subscriptions: {}", collection.feeds.len());
    println!("  Snapshot: {}", output.display().to_string().cyan());

    print_failures(&collection);

    Ok(())
}

fn baseline_command(path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(path)?;
    let yaml = catalog
        .to_yaml()
        .context("Failed to serialize baseline catalog")?;

    print!("{}", yaml);
    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<BaselineCatalog> {
    match path {
        Some(path) => {
            println!("{} Loading baseline: {}", "→".cyan(), path.display());
            BaselineCatalog::load(path)
                .with_context(|| format!("Failed to load baseline catalog {}", path.display()))
        }
        None => BaselineCatalog::builtin().context("Failed to load built-in baseline catalog"),
    }
}

/// Build the collector for the selected source
///
/// For live collection the token is acquired here, so authentication failures
/// stop the run before any subscription is touched.
fn build_collector(source: &SourceArgs) -> Result<Box<dyn Collector>> {
    if let Some(path) = &source.snapshot {
        println!("{} Reading snapshot: {}", "→".cyan(), path.display());
        let collector = SnapshotCollector::from_file(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        return Ok(Box::new(collector));
    }

    let token_source = TokenSource::resolve(
        source.access_token.clone(),
        source.tenant_id.clone(),
        source.client_id.clone(),
        source.client_secret.clone(),
    );
    println!(
        "{} Authenticating with {}",
        "→".cyan(),
        token_source.describe().yellow()
    );

    let token = token_source
        .acquire(&source.endpoint, &source.authority)
        .context("Failed to authenticate against Azure")?;
    let collector = ArmCollector::new(token)
        .context("Failed to build HTTP client")?
        .with_endpoint(&source.endpoint);

    Ok(Box::new(collector))
}

fn collect(source: &SourceArgs) -> Result<TenantCollection> {
    let collector = build_collector(source)?;
    let filter = SubscriptionFilter::new(&source.subscriptions);
    if !filter.is_empty() {
        debug!(patterns = ?source.subscriptions, "Filtering subscriptions");
    }

    println!("{} Enumerating subscriptions", "→".cyan());
    let collection = collect_tenant(collector.as_ref(), &filter, |event| match event {
        CollectionEvent::Started {
            index,
            total,
            subscription,
        } => {
            println!(
                "{} [{}/{}] {} ({})",
                "→".cyan(),
                index + 1,
                total,
                subscription.display_name.bold(),
                subscription.subscription_id
            );
        }
        CollectionEvent::Collected { feed } => {
            let registered = feed
                .providers
                .iter()
                .filter(|p| p.registration_state.is_registered())
                .count();
            println!(
                "  {} {} registered providers, {} resources",
                "✓".green(),
                registered,
                feed.total_resources()
            );
        }
        CollectionEvent::Failed { failure } => {
            println!("  {} Skipped: {}", "⚠".yellow(), failure.reason);
        }
    })
    .context("Failed to enumerate subscriptions")?;

    if collection.filtered_out > 0 {
        println!(
            "{} {} subscription(s) excluded by --subscription",
            "→".cyan(),
            collection.filtered_out
        );
    }

    Ok(collection)
}

fn source_label(source: &SourceArgs) -> String {
    match &source.snapshot {
        Some(path) => format!("snapshot {}", path.display()),
        None => source.endpoint.clone(),
    }
}

fn print_summary(report: &TenantReport, collection: &TenantCollection, verbose: bool) {
    let stats = &report.statistics;

    println!("\n{}", "Summary:".bold());
    println!("  Subscriptions: {}", stats.subscription_count);
    println!(
        "  Providers: {} ({} data plane, {} control plane)",
        stats.distinct_providers, stats.data_plane_providers, stats.control_plane_providers
    );
    println!("  Registrations: {}", stats.registration_pairs);
    println!("  Resources: {}", stats.total_resources);

    let limit = if verbose {
        report.providers.len()
    } else {
        TOP_PROVIDERS
    };
    if !report.providers.is_empty() {
        println!("\n{}", "Top providers:".bold());
        for provider in report.top_providers(limit) {
            println!(
                "  • {} {}/{} ({:.2}%) {}",
                provider.namespace.cyan(),
                provider.registered_count,
                stats.subscription_count,
                provider.percentage,
                provider.band.to_string().dimmed()
            );
        }
    }

    if let Some(compliance) = &report.required_compliance {
        print_compliance("Required providers", compliance);
    }
    if let Some(compliance) = &report.recommended_compliance {
        print_compliance("Recommended providers", compliance);
    }

    if !stats.deprecated_registered.is_empty() {
        println!(
            "\n{} Deprecated providers still registered: {}",
            "⚠".yellow(),
            stats.deprecated_registered.join(", ")
        );
    }

    print_failures(collection);
}

fn print_compliance(label: &str, compliance: &ComplianceResult) {
    let percentage = format!("{:.1}%", compliance.compliance_percentage);
    let percentage = if compliance.is_compliant() {
        percentage.green()
    } else {
        percentage.yellow()
    };

    println!(
        "\n{}: {} ({}/{})",
        label.bold(),
        percentage,
        compliance.found.len(),
        compliance.required_count
    );
    for namespace in &compliance.missing {
        println!("  {} missing {}", "⚠".yellow(), namespace);
    }
}

fn print_failures(collection: &TenantCollection) {
    if collection.failures.is_empty() {
        return;
    }

    println!(
        "\n{} {} subscription(s) skipped:",
        "⚠".yellow(),
        collection.failures.len()
    );
    for failure in &collection.failures {
        println!(
            "  • {} ({}): {}",
            failure.subscription_name, failure.subscription_id, failure.reason
        );
    }
}
