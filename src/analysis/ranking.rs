//! Agent helpfulness ranking.
//!
//! The ranking order is computed upstream (ascending average score, worst
//! agent first) and is exposed here as-is. This module only attaches locally
//! recounted rating breakdowns and flags entries that look inconsistent.

use crate::analysis::aggregator::rating_bucket_tally;
use crate::models::{AgentRankEntry, FeedbackItem, RatingCounts};
use serde::Serialize;
use std::fmt;

/// Lowest and highest valid average helpfulness scores.
pub const SCORE_RANGE: (f64, f64) = (1.0, 4.0);

/// Display band for an average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Low,
    Mid,
    High,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score < 2.0 {
            ScoreBand::Low
        } else if score < 3.0 {
            ScoreBand::Mid
        } else {
            ScoreBand::High
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ScoreBand::Low => "🔴",
            ScoreBand::Mid => "🟡",
            ScoreBand::High => "🟢",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Low => write!(f, "Low"),
            ScoreBand::Mid => write!(f, "Mid"),
            ScoreBand::High => write!(f, "High"),
        }
    }
}

/// A rank entry with its locally recounted rating breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAgent {
    #[serde(flatten)]
    pub entry: AgentRankEntry,
    pub band: ScoreBand,
    pub ratings: RatingCounts,
}

pub struct HelpfulnessRanker<'a> {
    ranking: &'a [AgentRankEntry],
    ratings_source: &'a [FeedbackItem],
}

impl<'a> HelpfulnessRanker<'a> {
    pub fn new(ranking: &'a [AgentRankEntry], ratings_source: &'a [FeedbackItem]) -> Self {
        Self {
            ranking,
            ratings_source,
        }
    }

    /// The ranking exactly as supplied. Never re-sorted.
    pub fn rank(&self) -> &'a [AgentRankEntry] {
        self.ranking
    }

    /// Rating buckets for one agent, recounted from the rating source.
    pub fn rating_breakdown(&self, agent: &str) -> RatingCounts {
        rating_bucket_tally(self.ratings_source, &[agent.to_string()])
            .remove(agent)
            .unwrap_or_default()
    }

    /// Every entry with its rating breakdown, in rank order.
    pub fn annotated(&self) -> Vec<RankedAgent> {
        self.rank()
            .iter()
            .map(|entry| RankedAgent {
                entry: entry.clone(),
                band: ScoreBand::from_score(entry.avg_score),
                ratings: self.rating_breakdown(&entry.agent),
            })
            .collect()
    }

    /// Report scores outside the valid range and out-of-order neighbours.
    ///
    /// Findings are returned as warnings; the ranking itself is left untouched.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let (lo, hi) = SCORE_RANGE;

        for entry in self.ranking {
            if !(lo..=hi).contains(&entry.avg_score) {
                warnings.push(format!(
                    "agent {} has avg_score {:.2} outside [{}, {}]",
                    entry.agent, entry.avg_score, lo, hi
                ));
            }
        }

        for pair in self.ranking.windows(2) {
            if pair[1].avg_score < pair[0].avg_score {
                warnings.push(format!(
                    "ranking not ascending: {} ({:.2}) listed before {} ({:.2})",
                    pair[0].agent, pair[0].avg_score, pair[1].agent, pair[1].avg_score
                ));
            }
        }

        warnings
    }
}
