//! Data models for the curation dashboard.
//!
//! This module contains the closed vocabularies (sentiments and rating
//! buckets), the raw and validated feedback records of each annotator, the
//! consensus records derived from them, and the shapes of the precomputed
//! analysis document supplied upstream.

use crate::error::{AnalyticsError, AnalyticsResult, Vocabulary};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentiment assigned to a feedback item by one annotator.
///
/// Ordering follows [`Sentiment::severity`]: `Bug < Negative < Neutral < Positive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Bug,
}

impl Sentiment {
    /// All categories in display order.
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Neutral,
        Sentiment::Negative,
        Sentiment::Bug,
    ];

    /// Severity rank, most severe first. Used as the consensus tie-break key.
    pub fn severity(self) -> u8 {
        match self {
            Sentiment::Bug => 0,
            Sentiment::Negative => 1,
            Sentiment::Neutral => 2,
            Sentiment::Positive => 3,
        }
    }

    /// Wire label (`"positive"`, `"bug"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::Bug => "bug",
        }
    }

    /// Returns an emoji representation of the sentiment.
    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Positive => "🟢",
            Sentiment::Neutral => "🔵",
            Sentiment::Negative => "🔴",
            Sentiment::Bug => "🟠",
        }
    }
}

impl Ord for Sentiment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for Sentiment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Bug => write!(f, "Bug"),
        }
    }
}

impl FromStr for Sentiment {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            "bug" => Ok(Sentiment::Bug),
            other => Err(AnalyticsError::UnknownCategory {
                vocabulary: Vocabulary::Sentiment,
                value: other.to_string(),
                item_id: None,
            }),
        }
    }
}

/// Qualitative helpfulness rating one item gives one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatingBucket {
    #[serde(rename = "Very helpful")]
    VeryHelpful,
    #[serde(rename = "Moderately helpful")]
    ModeratelyHelpful,
    #[serde(rename = "Slightly helpful")]
    SlightlyHelpful,
    #[serde(rename = "Not at all helpful")]
    NotAtAllHelpful,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl RatingBucket {
    /// All buckets in display order.
    pub const ALL: [RatingBucket; 5] = [
        RatingBucket::VeryHelpful,
        RatingBucket::ModeratelyHelpful,
        RatingBucket::SlightlyHelpful,
        RatingBucket::NotAtAllHelpful,
        RatingBucket::NotApplicable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RatingBucket::VeryHelpful => "Very helpful",
            RatingBucket::ModeratelyHelpful => "Moderately helpful",
            RatingBucket::SlightlyHelpful => "Slightly helpful",
            RatingBucket::NotAtAllHelpful => "Not at all helpful",
            RatingBucket::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RatingBucket {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatingBucket::ALL
            .into_iter()
            .find(|bucket| bucket.label() == s)
            .ok_or_else(|| AnalyticsError::UnknownCategory {
                vocabulary: Vocabulary::RatingBucket,
                value: s.to_string(),
                item_id: None,
            })
    }
}

/// Count of items per sentiment category.
///
/// Deserializing rejects keys outside the four categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub bug: usize,
}

impl SentimentCounts {
    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
            Sentiment::Bug => self.bug,
        }
    }

    pub fn increment(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Bug => self.bug += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative + self.bug
    }
}

/// Count of items per rating bucket for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatingCounts {
    #[serde(rename = "Very helpful")]
    pub very_helpful: usize,
    #[serde(rename = "Moderately helpful")]
    pub moderately_helpful: usize,
    #[serde(rename = "Slightly helpful")]
    pub slightly_helpful: usize,
    #[serde(rename = "Not at all helpful")]
    pub not_at_all_helpful: usize,
    #[serde(rename = "N/A")]
    pub not_applicable: usize,
}

impl RatingCounts {
    pub fn get(&self, bucket: RatingBucket) -> usize {
        match bucket {
            RatingBucket::VeryHelpful => self.very_helpful,
            RatingBucket::ModeratelyHelpful => self.moderately_helpful,
            RatingBucket::SlightlyHelpful => self.slightly_helpful,
            RatingBucket::NotAtAllHelpful => self.not_at_all_helpful,
            RatingBucket::NotApplicable => self.not_applicable,
        }
    }

    pub fn increment(&mut self, bucket: RatingBucket) {
        match bucket {
            RatingBucket::VeryHelpful => self.very_helpful += 1,
            RatingBucket::ModeratelyHelpful => self.moderately_helpful += 1,
            RatingBucket::SlightlyHelpful => self.slightly_helpful += 1,
            RatingBucket::NotAtAllHelpful => self.not_at_all_helpful += 1,
            RatingBucket::NotApplicable => self.not_applicable += 1,
        }
    }

    pub fn total(&self) -> usize {
        RatingBucket::ALL.into_iter().map(|b| self.get(b)).sum()
    }
}

/// Item ids arrive as strings or bare integers depending on the export.
fn deserialize_item_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(i64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    })
}

/// One annotator's record for one feedback item, exactly as exported.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeedbackItem {
    #[serde(deserialize_with = "deserialize_item_id")]
    pub item_id: String,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default)]
    pub sentiment_label: Option<String>,
    #[serde(default)]
    pub related_agents_label: Option<Vec<String>>,
    #[serde(default)]
    pub agent_ratings: Option<BTreeMap<String, Option<String>>>,
}

impl RawFeedbackItem {
    /// Validate the record against the closed vocabularies.
    ///
    /// A null or empty sentiment label means the annotator gave no label.
    /// Null ratings are dropped. Any other out-of-vocabulary value is an
    /// `UnknownCategory` error carrying this record's `item_id`.
    pub fn validate(self) -> AnalyticsResult<FeedbackItem> {
        let item_id = self.item_id;

        let sentiment_label = match self.sentiment_label.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(
                label
                    .parse::<Sentiment>()
                    .map_err(|e| e.for_item(&item_id))?,
            ),
        };

        let mut related_agents_label: Vec<String> = Vec::new();
        for agent in self.related_agents_label.unwrap_or_default() {
            if !related_agents_label.contains(&agent) {
                related_agents_label.push(agent);
            }
        }

        let mut agent_ratings = BTreeMap::new();
        for (agent, rating) in self.agent_ratings.unwrap_or_default() {
            if let Some(rating) = rating {
                let bucket = rating
                    .parse::<RatingBucket>()
                    .map_err(|e| e.for_item(&item_id))?;
                agent_ratings.insert(agent, bucket);
            }
        }

        Ok(FeedbackItem {
            feedback_text: self.feedback_text.unwrap_or_default(),
            related_agents_label,
            agent_ratings,
            ..FeedbackItem::new(&item_id, sentiment_label)
        })
    }
}

/// A validated feedback record from one annotator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    pub item_id: String,
    pub feedback_text: String,
    pub sentiment_label: Option<Sentiment>,
    /// Agents the feedback concerns, without duplicates.
    pub related_agents_label: Vec<String>,
    pub agent_ratings: BTreeMap<String, RatingBucket>,
}

impl FeedbackItem {
    /// Creates a record with a label and no agents or ratings.
    pub fn new(item_id: &str, sentiment_label: Option<Sentiment>) -> Self {
        Self {
            item_id: item_id.to_string(),
            feedback_text: String::new(),
            sentiment_label,
            related_agents_label: Vec::new(),
            agent_ratings: BTreeMap::new(),
        }
    }
}

/// The resolved view of one item across both annotators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusRecord {
    pub item_id: String,
    pub im_label: Option<Sentiment>,
    pub nn_label: Option<Sentiment>,
    pub consensus_label: Sentiment,
    pub agrees: bool,
    /// Agents attributed after consensus (NN's list when non-empty, else IM's).
    pub related_agents: Vec<String>,
    pub feedback_text: String,
}

impl ConsensusRecord {
    /// True when both annotators supplied a label.
    pub fn double_annotated(&self) -> bool {
        self.im_label.is_some() && self.nn_label.is_some()
    }
}

/// Externally ranked agent, worst average helpfulness first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRankEntry {
    pub agent: String,
    pub avg_score: f64,
    #[serde(default)]
    pub positive_count: usize,
    #[serde(default)]
    pub negative_count: usize,
}

/// Inter-annotator statistics computed offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterAnnotatorStats {
    pub total_items: usize,
    pub agreement_pct: f64,
    pub im_distribution: SentimentCounts,
    pub nn_distribution: SentimentCounts,
    pub disagreements: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeAnalysis {
    pub total: usize,
    pub research_flaw_count: usize,
    pub prompt_context_count: usize,
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineeringBacklog {
    pub subcategories: BTreeMap<String, usize>,
    pub priority_order: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositiveAnalysis {
    pub total: usize,
    pub themes: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BugAnalysis {
    pub total: usize,
    pub by_agent: BTreeMap<String, usize>,
}

/// The precomputed analysis document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResults {
    pub inter_annotator: InterAnnotatorStats,
    pub consensus_distribution: SentimentCounts,
    pub agent_helpfulness_ranking: Vec<AgentRankEntry>,
    pub agent_sentiment: BTreeMap<String, SentimentCounts>,
    pub negative_analysis: NegativeAnalysis,
    pub engineering_backlog: EngineeringBacklog,
    pub positive_analysis: PositiveAnalysis,
    pub bug_analysis: BugAnalysis,
}

/// A suggested prompt addition for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAddition {
    pub text: String,
    #[serde(default)]
    pub rationale: String,
}

/// Prompt improvement suggestions derived from negative feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSuggestion {
    pub agent: String,
    pub avg_score: f64,
    #[serde(default)]
    pub negative_count: usize,
    #[serde(default)]
    pub positive_count: usize,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub prompts: Vec<PromptAddition>,
}

/// A precomputed figure that disagrees with the local recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub metric: String,
    pub key: String,
    pub precomputed: String,
    pub recomputed: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: precomputed {} vs recomputed {}",
            self.metric, self.key, self.precomputed, self.recomputed
        )
    }
}

/// Data-completeness findings accumulated alongside normal results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Items only present in IM's record set.
    pub im_only: Vec<String>,
    /// Items only present in NN's record set.
    pub nn_only: Vec<String>,
    /// Items with no sentiment label from either annotator.
    pub unresolvable: Vec<String>,
    pub warnings: Vec<String>,
    pub mismatches: Vec<Mismatch>,
}

impl Diagnostics {
    pub fn missing_counterparts(&self) -> usize {
        self.im_only.len() + self.nn_only.len()
    }

    pub fn is_clean(&self) -> bool {
        self.missing_counterparts() == 0
            && self.unresolvable.is_empty()
            && self.warnings.is_empty()
            && self.mismatches.is_empty()
    }
}
