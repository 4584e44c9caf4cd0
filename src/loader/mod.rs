//! Loading of the static dashboard data.
//!
//! The data set is read once at startup, either from a local directory or
//! from an HTTP(S) base URL. Raw records are validated against the closed
//! sentiment and rating vocabularies before anything else sees them.

use crate::config::DataConfig;
use crate::error::Annotator;
use crate::models::{AnalysisResults, FeedbackItem, PromptSuggestion, RawFeedbackItem};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Where the data files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Local directory containing the JSON files.
    Dir(PathBuf),
    /// Base URL the JSON files are served under (no trailing slash).
    Url(String),
}

impl DataSource {
    /// Interpret a `--source` value: `http(s)://` prefixes are URLs, anything
    /// else is a directory.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            DataSource::Url(value.trim_end_matches('/').to_string())
        } else {
            DataSource::Dir(PathBuf::from(value))
        }
    }

    fn describe(&self, file: &str) -> String {
        match self {
            DataSource::Dir(dir) => dir.join(file).display().to_string(),
            DataSource::Url(base) => format!("{}/{}", base, file),
        }
    }
}

/// Everything the dashboard is built from.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub results: AnalysisResults,
    pub im: Vec<FeedbackItem>,
    pub nn: Vec<FeedbackItem>,
    pub prompts: Option<Vec<PromptSuggestion>>,
}

struct Fetcher<'a> {
    source: &'a DataSource,
    client: reqwest::Client,
}

impl Fetcher<'_> {
    /// Fetch one file. A missing file (not found / HTTP 404) is `Ok(None)`.
    async fn fetch(&self, file: &str) -> Result<Option<String>> {
        let location = self.source.describe(file);
        debug!("Fetching {}", location);

        match self.source {
            DataSource::Dir(dir) => match tokio::fs::read_to_string(dir.join(file)).await {
                Ok(text) => Ok(Some(text)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e).with_context(|| format!("Failed to read {}", location)),
            },
            DataSource::Url(_) => {
                let response = self
                    .client
                    .get(&location)
                    .send()
                    .await
                    .with_context(|| format!("Failed to request {}", location))?;

                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }

                let text = response
                    .error_for_status()
                    .with_context(|| format!("Bad response for {}", location))?
                    .text()
                    .await
                    .with_context(|| format!("Failed to read body of {}", location))?;
                Ok(Some(text))
            }
        }
    }

    async fn fetch_required(&self, file: &str) -> Result<String> {
        match self.fetch(file).await? {
            Some(text) => Ok(text),
            None => bail!("Required data file not found: {}", self.source.describe(file)),
        }
    }
}

/// Parse and validate one annotator's record set.
pub fn parse_records(text: &str, annotator: Annotator) -> Result<Vec<FeedbackItem>> {
    let raw: Vec<RawFeedbackItem> = serde_json::from_str(text)
        .with_context(|| format!("Failed to parse {} record set", annotator))?;

    raw.into_iter()
        .map(|item| {
            item.validate()
                .with_context(|| format!("Invalid record in {} record set", annotator))
        })
        .collect()
}

fn spinner(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Loading dashboard data...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Load the full corpus. The required files are fetched concurrently.
pub async fn load_corpus(
    source: &DataSource,
    files: &DataConfig,
    show_progress: bool,
) -> Result<Corpus> {
    info!("Loading data from {:?}", source);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(files.timeout_seconds))
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher = Fetcher { source, client };

    let pb = spinner(show_progress);

    let fetched = futures::try_join!(
        fetcher.fetch_required(&files.results_file),
        fetcher.fetch_required(&files.im_labels_file),
        fetcher.fetch_required(&files.nn_labels_file),
        fetcher.fetch(&files.prompts_file),
    );
    pb.finish_and_clear();
    let (results_text, im_text, nn_text, prompts_text) = fetched?;

    let results: AnalysisResults = serde_json::from_str(&results_text)
        .with_context(|| format!("Failed to parse {}", files.results_file))?;
    let im = parse_records(&im_text, Annotator::Im)?;
    let nn = parse_records(&nn_text, Annotator::Nn)?;

    let prompts = match prompts_text {
        Some(text) => Some(
            serde_json::from_str::<Vec<PromptSuggestion>>(&text)
                .with_context(|| format!("Failed to parse {}", files.prompts_file))?,
        ),
        None => {
            debug!("No {} found; skipping prompt suggestions", files.prompts_file);
            None
        }
    };

    info!(
        "Loaded {} IM records, {} NN records, {} ranked agents",
        im.len(),
        nn.len(),
        results.agent_helpfulness_ranking.len()
    );

    Ok(Corpus {
        results,
        im,
        nn,
        prompts,
    })
}
