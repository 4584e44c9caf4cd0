//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::DisagreementKey;
use crate::error::Annotator;
use clap::Parser;
use std::path::PathBuf;

/// Curation Dashboard - consensus analytics for review-agent feedback
///
/// Reconciles two annotators' sentiment labels into a consensus view and
/// builds per-agent statistics from the curated feedback corpus.
///
/// Examples:
///   curation-dashboard --source ./data
///   curation-dashboard --source https://example.org/feedback_app/data --format json
///   curation-dashboard --source ./data --fail-on missing-counterpart
///   curation-dashboard --dry-run
///   curation-dashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory or http(s) base URL holding the data files
    ///
    /// Defaults to the config file value, or ./data.
    #[arg(short, long, value_name = "DIR|URL", env = "CURATION_DATA_SOURCE")]
    pub source: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .curation.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of negative feedback samples to include
    #[arg(long, value_name = "COUNT")]
    pub samples: Option<usize>,

    /// Annotator whose agent ratings feed the rating breakdowns
    #[arg(long, value_name = "ANNOTATOR")]
    pub rating_source: Option<Annotator>,

    /// Grouping for the disagreement tally
    #[arg(long, value_name = "KEY")]
    pub disagreement_key: Option<DisagreementKey>,

    /// Leave the prompt improvements section out of the report
    #[arg(long)]
    pub no_prompts: bool,

    /// Fail (exit code 2) when diagnostics of this kind are found
    ///
    /// Values: unresolvable, missing-counterpart, mismatch, any
    #[arg(long, value_name = "KIND")]
    pub fail_on: Option<FailOn>,

    /// Dry run: load and validate the data, print counts, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .curation.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

/// Diagnostic kinds that can fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailOn {
    /// Items with no label from either annotator
    Unresolvable,
    /// Items present in only one annotator's record set
    MissingCounterpart,
    /// Precomputed figures that differ from the recount
    Mismatch,
    /// Any diagnostic at all
    Any,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref source) = self.source {
            if source.trim().is_empty() {
                return Err("Data source must not be empty".to_string());
            }
            if source.contains("://")
                && !source.starts_with("http://")
                && !source.starts_with("https://")
            {
                return Err("Data source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` comes from the config file; `--quiet` overrides it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
