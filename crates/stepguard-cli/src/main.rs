//! stepguard CLI - step definition registry auditing
//!
//! Usage:
//!   stepguard init                      Write default .stepguard/config.toml
//!   stepguard scan                      Scan step definitions and summarize
//!   stepguard conflicts                 Report ambiguous step patterns
//!   stepguard resolve <description>     Resolve a new step against the corpus
//!   stepguard suggest <description>     List reusable steps for a description
//!   stepguard classify <text>           Show the domain assigned to text

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use stepguard_core::{CandidateStep, ConflictRecord, RegistryConfig, Severity, StepType};
use std::collections::BTreeMap;
use stepguard_registry::{build_index, ConflictReport, DomainClassifier, IndexBuild};
use stepguard_resolver::StepResolver;
use stepguard_scan::{CorpusSource, JsonCorpusSource, StepFileScanner};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "stepguard")]
#[command(author, version, about = "Detect and avoid ambiguous Gherkin step definitions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the corpus comes from
#[derive(Args, Clone)]
struct CorpusArgs {
    /// Repository root to scan and read configuration from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Read occurrences from a JSON corpus file instead of scanning
    #[arg(long, value_name = "FILE")]
    corpus: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Scan step definitions and print what was indexed
    Scan {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Print indexed occurrences as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report normalized patterns registered more than once
    Conflicts {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with an error when a conflict of this severity or higher exists
        #[arg(long, value_name = "SEVERITY")]
        fail_on: Option<CliSeverity>,
    },

    /// Resolve a new step so it cannot collide with the corpus
    Resolve {
        /// Natural-language step description
        description: String,

        /// Domain of the step (classified from the description when omitted)
        #[arg(short, long)]
        domain: Option<String>,

        /// Step type (given, background, navigation, verification, assert, interaction)
        #[arg(short = 't', long = "type", default_value = "interaction")]
        step_type: String,

        /// Override the configured reuse threshold
        #[arg(long)]
        threshold: Option<f64>,

        #[command(flatten)]
        corpus: CorpusArgs,

        /// Print the resolved step as JSON
        #[arg(long)]
        json: bool,
    },

    /// List existing steps similar to a description
    Suggest {
        /// Natural-language step description
        description: String,

        /// Domain to search (classified from the description when omitted)
        #[arg(short, long)]
        domain: Option<String>,

        /// Maximum suggestions (defaults to the configured limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Show the domain assigned to a piece of text
    Classify {
        /// Text to classify (a path, step text, ...)
        text: String,

        /// Restrict classification to these domains
        #[arg(long = "known", value_name = "DOMAIN")]
        known: Vec<String>,

        /// Repository root to read domain rules from
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

/// Severity levels accepted on the command line
#[derive(Clone, Copy, ValueEnum)]
enum CliSeverity {
    Low,
    Medium,
    High,
}

impl From<CliSeverity> for Severity {
    fn from(s: CliSeverity) -> Self {
        match s {
            CliSeverity::Low => Severity::Low,
            CliSeverity::Medium => Severity::Medium,
            CliSeverity::High => Severity::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(path),
        Commands::Scan { corpus, json } => cmd_scan(corpus, json).await,
        Commands::Conflicts {
            corpus,
            json,
            fail_on,
        } => cmd_conflicts(corpus, json, fail_on.map(Severity::from)).await,
        Commands::Resolve {
            description,
            domain,
            step_type,
            threshold,
            corpus,
            json,
        } => cmd_resolve(description, domain, step_type, threshold, corpus, json).await,
        Commands::Suggest {
            description,
            domain,
            limit,
            corpus,
        } => cmd_suggest(description, domain, limit, corpus).await,
        Commands::Classify { text, known, root } => cmd_classify(text, known, root),
    }
}

fn load_config(root: &Path) -> Result<RegistryConfig> {
    RegistryConfig::load_or_default(root)
        .with_context(|| format!("Failed to load configuration from {:?}", root))
}

async fn load_build(args: &CorpusArgs, config: &RegistryConfig) -> Result<IndexBuild> {
    let source: Box<dyn CorpusSource> = match &args.corpus {
        Some(file) => Box::new(JsonCorpusSource::new(file)),
        None => Box::new(StepFileScanner::from_config(&args.root, config)),
    };

    info!("Loading corpus from {}", source.describe());
    let records = source
        .load()
        .await
        .with_context(|| format!("Failed to load corpus from {}", source.describe()))?;

    let build = build_index(records);
    for skipped in &build.skipped {
        warn!("Skipped {}: {}", skipped.source_id, skipped.reason);
    }
    Ok(build)
}

fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing stepguard in {:?}", path);
    RegistryConfig::write_default(&path).context("Failed to write default configuration")?;

    println!("Initialized stepguard in {:?}", path);
    println!("Created:");
    println!("  .stepguard/config.toml");
    Ok(())
}

async fn cmd_scan(args: CorpusArgs, json: bool) -> Result<()> {
    let config = load_config(&args.root)?;
    let build = load_build(&args, &config).await?;

    if json {
        let occurrences: Vec<_> = build.index.iter().collect();
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
        return Ok(());
    }

    println!("Step Corpus");
    println!("===========");
    println!("Occurrences: {}", build.index.len());
    println!("Distinct patterns: {}", build.index.pattern_count());
    println!("Skipped: {}", build.skipped.len());

    let parameterized = build.index.iter().filter(|o| o.is_parameterized).count();
    println!("Parameterized: {}", parameterized);

    println!("\nBy domain:");
    for (domain, count) in domain_counts(&build) {
        println!("  {}: {}", domain, count);
    }

    Ok(())
}

/// Occurrences per domain present in the index, ordered by name
fn domain_counts(build: &IndexBuild) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for occurrence in build.index.iter() {
        *counts.entry(occurrence.domain.as_str()).or_insert(0) += 1;
    }
    counts
}

async fn cmd_conflicts(args: CorpusArgs, json: bool, fail_on: Option<Severity>) -> Result<()> {
    let config = load_config(&args.root)?;
    let build = load_build(&args, &config).await?;
    let report = ConflictReport::from_build(&build);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let (Some(threshold), Some(worst)) = (fail_on, report.max_severity()) {
        if worst >= threshold {
            bail!("Found {} conflict(s), worst severity {}", report.conflicts.len(), worst);
        }
    }

    Ok(())
}

fn print_report(report: &ConflictReport) {
    println!("Conflict Report");
    println!("===============");
    println!(
        "Occurrences: {} ({} distinct patterns)",
        report.total_occurrences, report.distinct_patterns
    );
    println!("Skipped: {}", report.skipped.len());
    println!(
        "Conflicts: {} (high {}, medium {}, low {})",
        report.conflicts.len(),
        report.summary.high,
        report.summary.medium,
        report.summary.low
    );

    for conflict in &report.conflicts {
        print_conflict(conflict);
    }
}

fn print_conflict(conflict: &ConflictRecord) {
    println!(
        "\n[{}] {} ({} occurrences)",
        conflict.severity,
        conflict.normalized_pattern,
        conflict.occurrences.len()
    );
    for occurrence in &conflict.occurrences {
        println!(
            "  - {} {} {:?} ({})",
            occurrence.keyword, occurrence.source_id, occurrence.raw_pattern, occurrence.domain
        );
    }
    println!("  Recommendation: {}", conflict.recommendation);
}

async fn cmd_resolve(
    description: String,
    domain: Option<String>,
    step_type: String,
    threshold: Option<f64>,
    args: CorpusArgs,
    json: bool,
) -> Result<()> {
    let mut config = load_config(&args.root)?;
    if let Some(threshold) = threshold {
        config = config.with_reuse_threshold(threshold)?;
    }

    let build = load_build(&args, &config).await?;
    let domain = domain.unwrap_or_else(|| {
        DomainClassifier::from_config(&config)
            .classify(&description)
            .to_string()
    });
    let candidate = CandidateStep::new(description, domain, StepType::from(step_type));

    let resolver = StepResolver::from_config(&build.index, &config)?;
    let step = resolver.resolve(&candidate);

    if json {
        println!("{}", serde_json::to_string_pretty(&step)?);
    } else {
        println!("{}", step.to_gherkin());
        println!("  Source: {}", step.source);
        if let Some(origin) = &step.origin_source_id {
            println!("  Origin: {}", origin);
        }
        if let Some(score) = step.score {
            println!("  Similarity: {:.0}%", score * 100.0);
        }
    }

    if step.unresolved {
        bail!(
            "No collision-free pattern found for {:?} in domain {}; needs manual review",
            candidate.description,
            candidate.domain
        );
    }

    Ok(())
}

async fn cmd_suggest(
    description: String,
    domain: Option<String>,
    limit: Option<usize>,
    args: CorpusArgs,
) -> Result<()> {
    let config = load_config(&args.root)?;
    let build = load_build(&args, &config).await?;

    let domain = domain.unwrap_or_else(|| {
        DomainClassifier::from_config(&config)
            .classify(&description)
            .to_string()
    });
    let suggestions = build.index.suggest(
        &description,
        &domain,
        limit.unwrap_or(config.suggestion_limit),
    );

    if suggestions.is_empty() {
        println!("No similar steps in domain {}", domain);
        return Ok(());
    }

    println!("Similar steps ({}):", domain);
    for suggestion in suggestions {
        println!(
            "  {:>3.0}%  {} {}  ({})",
            suggestion.score * 100.0,
            suggestion.occurrence.keyword,
            suggestion.occurrence.raw_pattern,
            suggestion.occurrence.source_id
        );
    }

    Ok(())
}

fn cmd_classify(text: String, known: Vec<String>, root: PathBuf) -> Result<()> {
    let config = load_config(&root)?;
    println!("{}", classify_with_config(&config, &text, &known));
    Ok(())
}

/// Classify with the configured rules, the same table the scanner uses
fn classify_with_config(config: &RegistryConfig, text: &str, known: &[String]) -> String {
    let known: Vec<&str> = known.iter().map(String::as_str).collect();
    DomainClassifier::from_config(config)
        .restricted_to(&known)
        .classify(text)
        .to_string()
}
