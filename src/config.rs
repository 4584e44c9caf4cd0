//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.curation.toml` files.

use crate::analysis::DisagreementKey;
use crate::error::Annotator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".curation.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Chart theme handed to the presentation layer.
    #[serde(default)]
    pub theme: ChartTheme,

    /// Display label overrides.
    #[serde(default)]
    pub labels: LabelsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "feedback_dashboard.md".to_string()
}

/// Where the data files come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory or http(s) base URL holding the data files.
    #[serde(default = "default_source")]
    pub source: String,

    /// Precomputed analysis document.
    #[serde(default = "default_results_file")]
    pub results_file: String,

    /// IM annotator records.
    #[serde(default = "default_im_labels_file")]
    pub im_labels_file: String,

    /// NN annotator records.
    #[serde(default = "default_nn_labels_file")]
    pub nn_labels_file: String,

    /// Optional prompt suggestions.
    #[serde(default = "default_prompts_file")]
    pub prompts_file: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            results_file: default_results_file(),
            im_labels_file: default_im_labels_file(),
            nn_labels_file: default_nn_labels_file(),
            prompts_file: default_prompts_file(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_source() -> String {
    "./data".to_string()
}

fn default_results_file() -> String {
    "labelling_analysis_results.json".to_string()
}

fn default_im_labels_file() -> String {
    "csv_curator_labels_im.json".to_string()
}

fn default_nn_labels_file() -> String {
    "csv_curator_labels_nn.json".to_string()
}

fn default_prompts_file() -> String {
    "prompt_suggestions.json".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Annotator whose `agent_ratings` feed the rating breakdowns.
    #[serde(default)]
    pub rating_source: Annotator,

    /// Grouping used for the disagreement tally.
    #[serde(default)]
    pub disagreement_key: DisagreementKey,

    /// Agents always present in per-agent tallies, even with zero mentions.
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rating_source: Annotator::default(),
            disagreement_key: DisagreementKey::default(),
            agents: default_agents(),
        }
    }
}

fn default_agents() -> Vec<String> {
    vec![
        "novelty",
        "scope",
        "ethics",
        "methodology_reporting",
        "methodology_validation",
        "integrity",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of negative feedback samples to list.
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Include the prompt improvements section when suggestions exist.
    #[serde(default = "default_true")]
    pub include_prompts: bool,

    /// Include the data quality section.
    #[serde(default = "default_true")]
    pub include_diagnostics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sample_limit: default_sample_limit(),
            include_prompts: true,
            include_diagnostics: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sample_limit() -> usize {
    15
}

/// Chart styling passed explicitly to whatever renders the charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Draw legend entries with point markers instead of boxes.
    #[serde(default = "default_true")]
    pub legend_point_style: bool,

    #[serde(default = "default_point_style_width")]
    pub point_style_width: u32,

    #[serde(default)]
    pub sentiment_colors: SentimentColors,

    /// Cycled per agent in rank order.
    #[serde(default = "default_agent_palette")]
    pub agent_palette: Vec<String>,

    /// One color per rating bucket, in bucket order.
    #[serde(default = "default_rating_palette")]
    pub rating_palette: Vec<String>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            font_size: default_font_size(),
            legend_point_style: true,
            point_style_width: default_point_style_width(),
            sentiment_colors: SentimentColors::default(),
            agent_palette: default_agent_palette(),
            rating_palette: default_rating_palette(),
        }
    }
}

impl ChartTheme {
    /// Palette color for the agent at `index`, wrapping around.
    pub fn agent_color(&self, index: usize) -> Option<&str> {
        if self.agent_palette.is_empty() {
            return None;
        }
        Some(&self.agent_palette[index % self.agent_palette.len()])
    }
}

fn default_font_family() -> String {
    "-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif".to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_point_style_width() -> u32 {
    10
}

fn default_agent_palette() -> Vec<String> {
    vec!["#3498db", "#2ecc71", "#e74c3c", "#f39c12", "#9b59b6", "#1abc9c"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_rating_palette() -> Vec<String> {
    vec!["#27ae60", "#2ecc71", "#f1c40f", "#e74c3c", "#bdc3c7"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentColors {
    pub positive: String,
    pub neutral: String,
    pub negative: String,
    pub bug: String,
}

impl Default for SentimentColors {
    fn default() -> Self {
        Self {
            positive: "#27ae60".to_string(),
            neutral: "#3498db".to_string(),
            negative: "#e74c3c".to_string(),
            bug: "#f39c12".to_string(),
        }
    }
}

/// Display label overrides, merged over the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default)]
    pub agents: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only when
    /// they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.source {
            self.data.source = source.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(rating_source) = args.rating_source {
            self.analysis.rating_source = rating_source;
        }
        if let Some(key) = args.disagreement_key {
            self.analysis.disagreement_key = key;
        }
        if let Some(samples) = args.samples {
            self.report.sample_limit = samples;
        }
        if args.no_prompts {
            self.report.include_prompts = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.source, "./data");
        assert_eq!(config.report.sample_limit, 15);
        assert_eq!(config.analysis.rating_source, Annotator::Im);
        assert!(config.analysis.agents.contains(&"ethics".to_string()));
        assert_eq!(config.theme.font_size, 12);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r##"
[general]
output = "dash.json"
verbose = true

[data]
source = "https://example.org/feedback"

[analysis]
rating_source = "nn"
disagreement_key = "pair"
agents = ["ethics", "scope"]

[theme]
font_size = 14
agent_palette = ["#000000"]

[labels.agents]
ethics = "Ethics & Consent"
"##;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "dash.json");
        assert!(config.general.verbose);
        assert_eq!(config.data.source, "https://example.org/feedback");
        assert_eq!(config.data.im_labels_file, "csv_curator_labels_im.json");
        assert_eq!(config.analysis.rating_source, Annotator::Nn);
        assert_eq!(config.analysis.disagreement_key, DisagreementKey::Pair);
        assert_eq!(config.analysis.agents, vec!["ethics", "scope"]);
        assert_eq!(config.theme.font_size, 14);
        assert_eq!(config.theme.sentiment_colors.bug, "#f39c12");
        assert_eq!(
            config.labels.agents.get("ethics").map(String::as_str),
            Some("Ethics & Consent")
        );
    }

    #[test]
    fn test_agent_color_wraps() {
        let theme = ChartTheme::default();
        assert_eq!(theme.agent_color(0), Some("#3498db"));
        assert_eq!(theme.agent_color(6), Some("#3498db"));

        let empty = ChartTheme {
            agent_palette: Vec::new(),
            ..ChartTheme::default()
        };
        assert_eq!(empty.agent_color(3), None);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[theme]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.report.sample_limit, 15);
    }
}
