//! Dashboard model assembled from the precomputed document and one analysis pass.
//!
//! Each view mirrors one page of the dashboard. The model is what the JSON
//! report serializes and what the Markdown generator renders.

use super::labels;
use crate::analysis::{sort_desc, Analysis, DisagreementKey, RankedAgent, ScoreBand};
use crate::config::{ChartTheme, Config};
use crate::error::Annotator;
use crate::loader::Corpus;
use crate::models::{Diagnostics, PromptAddition, Sentiment, SentimentCounts};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub overview: OverviewView,
    pub agents: AgentsView,
    pub negative: NegativeView,
    pub backlog: Vec<BacklogItem>,
    pub positive: PositiveView,
    pub bugs: BugsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<PromptCard>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
    pub theme: ChartTheme,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub im_records: usize,
    pub nn_records: usize,
    pub resolved_items: usize,
    pub rating_source: Annotator,
    pub disagreement_key: DisagreementKey,
}

/// A keyed count with its display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub total_items: usize,
    pub agreement_pct: f64,
    pub consensus_distribution: SentimentCounts,
    pub im_distribution: SentimentCounts,
    pub nn_distribution: SentimentCounts,
    /// Precomputed disagreements, highest count first.
    pub disagreements: Vec<LabeledCount>,
    pub recomputed_total_items: usize,
    pub recomputed_agreement_pct: f64,
    pub recomputed_consensus_distribution: SentimentCounts,
    pub recomputed_disagreements: Vec<LabeledCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankRow {
    pub label: String,
    #[serde(flatten)]
    pub ranked: RankedAgent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSentimentRow {
    pub agent: String,
    pub label: String,
    pub precomputed: SentimentCounts,
    pub recomputed: SentimentCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentsView {
    /// Upstream rank order, worst average score first.
    pub ranking: Vec<RankRow>,
    pub sentiment: Vec<AgentSentimentRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSample {
    pub item_id: String,
    /// Agent display names, or "General" when no agent is attributed.
    pub agents: String,
    pub im_label: Option<Sentiment>,
    pub nn_label: Option<Sentiment>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NegativeView {
    pub total: usize,
    pub research_flaw_count: usize,
    pub prompt_context_count: usize,
    pub engineering_change_count: usize,
    pub categories: Vec<LabeledCount>,
    /// Precomputed negative count per agent.
    pub by_agent: Vec<LabeledCount>,
    pub samples: Vec<FeedbackSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklogItem {
    /// 1-based priority from the upstream order.
    pub priority: usize,
    pub key: String,
    pub label: String,
    pub count: usize,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositiveView {
    pub total: usize,
    /// Themes, highest count first.
    pub themes: Vec<LabeledCount>,
    pub by_agent: Vec<LabeledCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BugsView {
    pub total: usize,
    /// Bug reports per agent, highest count first.
    pub by_agent: Vec<LabeledCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptCard {
    pub agent: String,
    pub label: String,
    pub avg_score: f64,
    pub band: ScoreBand,
    pub positive_count: usize,
    pub negative_count: usize,
    pub summary: String,
    pub issues: Vec<String>,
    pub prompts: Vec<PromptAddition>,
}

/// Build the dashboard model.
pub struct DashboardBuilder<'a> {
    corpus: &'a Corpus,
    analysis: &'a Analysis,
    config: &'a Config,
}

impl<'a> DashboardBuilder<'a> {
    pub fn new(corpus: &'a Corpus, analysis: &'a Analysis, config: &'a Config) -> Self {
        Self {
            corpus,
            analysis,
            config,
        }
    }

    fn agent_label(&self, agent: &str) -> String {
        labels::agent_label(agent, &self.config.labels.agents)
    }

    fn agent_counts(&self, counts: impl IntoIterator<Item = (String, usize)>) -> Vec<LabeledCount> {
        counts
            .into_iter()
            .map(|(key, count)| LabeledCount {
                label: self.agent_label(&key),
                key,
                count,
            })
            .collect()
    }

    /// Per-agent counts of one sentiment from the precomputed tally, in key order.
    fn precomputed_agent_column(&self, sentiment: Sentiment) -> Vec<LabeledCount> {
        self.agent_counts(
            self.corpus
                .results
                .agent_sentiment
                .iter()
                .map(|(agent, counts)| (agent.clone(), counts.get(sentiment))),
        )
    }

    fn overview(&self) -> OverviewView {
        let ia = &self.corpus.results.inter_annotator;
        let recomputed = &self.analysis.recomputed;
        let plain = |(key, count): (String, usize)| LabeledCount {
            label: key.clone(),
            key,
            count,
        };

        OverviewView {
            total_items: ia.total_items,
            agreement_pct: ia.agreement_pct,
            consensus_distribution: self.corpus.results.consensus_distribution,
            im_distribution: ia.im_distribution,
            nn_distribution: ia.nn_distribution,
            disagreements: sort_desc(ia.disagreements.clone())
                .into_iter()
                .map(plain)
                .collect(),
            recomputed_total_items: recomputed.total_items,
            recomputed_agreement_pct: recomputed.agreement_pct,
            recomputed_consensus_distribution: recomputed.consensus_distribution,
            recomputed_disagreements: self
                .analysis
                .disagreements
                .iter()
                .cloned()
                .map(plain)
                .collect(),
        }
    }

    fn agents(&self) -> AgentsView {
        let ranking = self
            .analysis
            .ranking
            .iter()
            .enumerate()
            .map(|(i, ranked)| RankRow {
                label: self.agent_label(&ranked.entry.agent),
                ranked: ranked.clone(),
                color: self.config.theme.agent_color(i).map(String::from),
            })
            .collect();

        let recomputed = &self.analysis.recomputed.agent_sentiment;
        let mut keys: Vec<&String> = self
            .corpus
            .results
            .agent_sentiment
            .keys()
            .chain(recomputed.keys())
            .collect();
        keys.sort();
        keys.dedup();

        let sentiment = keys
            .into_iter()
            .map(|agent| AgentSentimentRow {
                agent: agent.clone(),
                label: self.agent_label(agent),
                precomputed: self
                    .corpus
                    .results
                    .agent_sentiment
                    .get(agent)
                    .copied()
                    .unwrap_or_default(),
                recomputed: recomputed.get(agent).copied().unwrap_or_default(),
            })
            .collect();

        AgentsView { ranking, sentiment }
    }

    fn sample(&self, record: &crate::models::ConsensusRecord) -> FeedbackSample {
        let agents = if record.related_agents.is_empty() {
            "General".to_string()
        } else {
            record
                .related_agents
                .iter()
                .map(|a| self.agent_label(a))
                .collect::<Vec<_>>()
                .join(", ")
        };

        FeedbackSample {
            item_id: record.item_id.clone(),
            agents,
            im_label: record.im_label,
            nn_label: record.nn_label,
            text: record.feedback_text.clone(),
        }
    }

    fn negative(&self) -> NegativeView {
        let neg = &self.corpus.results.negative_analysis;

        let samples = crate::analysis::items_with_label(
            &self.analysis.consensus,
            Sentiment::Negative,
            self.config.report.sample_limit,
        )
        .into_iter()
        .map(|record| self.sample(record))
        .collect();

        NegativeView {
            total: neg.total,
            research_flaw_count: neg.research_flaw_count,
            prompt_context_count: neg.prompt_context_count,
            engineering_change_count: neg
                .categories
                .get("engineering_change")
                .copied()
                .unwrap_or_default(),
            categories: neg
                .categories
                .iter()
                .map(|(key, &count)| LabeledCount {
                    key: key.clone(),
                    label: labels::negative_category_label(key).to_string(),
                    count,
                })
                .collect(),
            by_agent: self.precomputed_agent_column(Sentiment::Negative),
            samples,
        }
    }

    fn backlog(&self) -> Vec<BacklogItem> {
        let backlog = &self.corpus.results.engineering_backlog;

        backlog
            .priority_order
            .iter()
            .enumerate()
            .map(|(i, key)| BacklogItem {
                priority: i + 1,
                key: key.clone(),
                label: labels::backlog_label(key).to_string(),
                count: backlog.subcategories.get(key).copied().unwrap_or_default(),
                description: labels::backlog_description(key).to_string(),
            })
            .collect()
    }

    fn positive(&self) -> PositiveView {
        let pos = &self.corpus.results.positive_analysis;

        PositiveView {
            total: pos.total,
            themes: sort_desc(pos.themes.clone())
                .into_iter()
                .map(|(key, count)| LabeledCount {
                    label: labels::positive_theme_label(&key).to_string(),
                    key,
                    count,
                })
                .collect(),
            by_agent: self.precomputed_agent_column(Sentiment::Positive),
        }
    }

    fn bugs(&self) -> BugsView {
        let bugs = &self.corpus.results.bug_analysis;

        BugsView {
            total: bugs.total,
            by_agent: self.agent_counts(sort_desc(bugs.by_agent.clone())),
        }
    }

    fn prompts(&self) -> Option<Vec<PromptCard>> {
        if !self.config.report.include_prompts {
            return None;
        }

        let suggestions = self.corpus.prompts.as_ref()?;
        Some(
            suggestions
                .iter()
                .map(|s| PromptCard {
                    agent: s.agent.clone(),
                    label: self.agent_label(&s.agent),
                    avg_score: s.avg_score,
                    band: ScoreBand::from_score(s.avg_score),
                    positive_count: s.positive_count,
                    negative_count: s.negative_count,
                    summary: s.summary.clone(),
                    issues: s.issues.clone(),
                    prompts: s.prompts.clone(),
                })
                .collect(),
        )
    }

    pub fn build(&self) -> Dashboard {
        let diagnostics = self
            .config
            .report
            .include_diagnostics
            .then(|| self.analysis.diagnostics.clone());

        Dashboard {
            metadata: DashboardMetadata {
                source: self.config.data.source.clone(),
                generated_at: Utc::now(),
                im_records: self.corpus.im.len(),
                nn_records: self.corpus.nn.len(),
                resolved_items: self.analysis.consensus.len(),
                rating_source: self.config.analysis.rating_source,
                disagreement_key: self.config.analysis.disagreement_key,
            },
            overview: self.overview(),
            agents: self.agents(),
            negative: self.negative(),
            backlog: self.backlog(),
            positive: self.positive(),
            bugs: self.bugs(),
            prompts: self.prompts(),
            diagnostics,
            theme: self.config.theme.clone(),
        }
    }
}

/// Convenience wrapper around [`DashboardBuilder`].
pub fn build_dashboard(corpus: &Corpus, analysis: &Analysis, config: &Config) -> Dashboard {
    DashboardBuilder::new(corpus, analysis, config).build()
}
