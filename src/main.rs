//! Curation Dashboard - consensus analytics for review-agent feedback
//!
//! A CLI tool that loads two annotators' labels for a corpus of editor
//! feedback, resolves them into a consensus view and renders a dashboard
//! report with per-agent statistics.
//!
//! Exit codes:
//!   0 - Success (no diagnostics of the --fail-on kind, or no --fail-on set)
//!   1 - Runtime error (missing data, parse failure, unknown category, etc.)
//!   2 - Diagnostics found matching --fail-on

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use analysis::{analyze, AnalysisOptions, Analysis};
use anyhow::{Context, Result};
use cli::{Args, FailOn, OutputFormat};
use config::{Config, CONFIG_FILE};
use loader::DataSource;
use models::Diagnostics;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("curation-dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard build failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .curation.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize data files, agents, labels and chart theme.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, analyze and report. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let source = DataSource::parse(&config.data.source);

    // Step 1: Load the data set
    if !args.quiet {
        println!("📥 Loading data from: {}", config.data.source);
    }
    let corpus = loader::load_corpus(&source, &config.data, !args.quiet).await?;

    // Step 2: Consensus + aggregation pass
    let options = AnalysisOptions {
        rating_source: config.analysis.rating_source,
        disagreement_key: config.analysis.disagreement_key,
        agents: config.analysis.agents.clone(),
    };
    let analysis = analyze(&corpus, &options);

    if args.dry_run {
        print_summary(&analysis, start_time.elapsed().as_secs_f64());
        println!("\n✅ Dry run complete. No report was written.");
        return Ok(fail_on_exit_code(args.fail_on, &analysis.diagnostics));
    }

    // Step 3: Build and save the report
    if !args.quiet {
        println!("\n📝 Generating report...");
    }
    let dashboard = report::build_dashboard(&corpus, &analysis, &config);

    let output_path = output_path(&args, &config);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        print_summary(&analysis, start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Dashboard complete! Report saved to: {}",
            output_path.display()
        );
    }

    Ok(fail_on_exit_code(args.fail_on, &analysis.diagnostics))
}

fn print_summary(analysis: &Analysis, duration: f64) {
    let counts = &analysis.recomputed.consensus_distribution;
    let diagnostics = &analysis.diagnostics;

    println!("\n📊 Consensus Summary:");
    println!("   Items resolved: {}", analysis.recomputed.total_items);
    println!(
        "   Annotator agreement: {:.1}%",
        analysis.recomputed.agreement_pct
    );
    println!(
        "   - 🟢 Positive: {} | 🔵 Neutral: {} | 🔴 Negative: {} | 🟠 Bug: {}",
        counts.positive, counts.neutral, counts.negative, counts.bug
    );
    println!(
        "   Missing counterparts: {} | Unresolvable: {} | Mismatches: {}",
        diagnostics.missing_counterparts(),
        diagnostics.unresolvable.len(),
        diagnostics.mismatches.len()
    );
    println!("   Duration: {:.1}s", duration);
}

/// Explicit --output wins; otherwise the configured path with the format's extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => Path::new(&config.general.output).with_extension(args.format.extension()),
    }
}

/// Exit code 2 when diagnostics of the requested kind exist.
fn fail_on_exit_code(fail_on: Option<FailOn>, diagnostics: &Diagnostics) -> i32 {
    let Some(kind) = fail_on else {
        return 0;
    };

    let triggered = match kind {
        FailOn::Unresolvable => !diagnostics.unresolvable.is_empty(),
        FailOn::MissingCounterpart => diagnostics.missing_counterparts() > 0,
        FailOn::Mismatch => !diagnostics.mismatches.is_empty(),
        FailOn::Any => !diagnostics.is_clean(),
    };

    if triggered {
        eprintln!(
            "\n⛔ Diagnostics found for --fail-on {:?}. Failing (exit code 2).",
            kind
        );
        2
    } else {
        0
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
