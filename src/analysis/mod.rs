//! Consensus resolution and feedback analytics.
//!
//! [`analyze`] runs one full pass over a loaded [`Corpus`]: it resolves every
//! item pair, recomputes the distributions, attaches rating breakdowns to the
//! precomputed ranking and cross-checks the precomputed figures.

pub mod aggregator;
pub mod consensus;
pub mod crosscheck;
pub mod ranking;

pub use aggregator::*;
pub use consensus::{build_consensus, ConsensusPass};
pub use crosscheck::{cross_check, Recomputed};
pub use ranking::{HelpfulnessRanker, RankedAgent, ScoreBand};

use crate::error::Annotator;
use crate::loader::Corpus;
use crate::models::{ConsensusRecord, Diagnostics};
use tracing::{debug, info};

/// Knobs for one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub rating_source: Annotator,
    pub disagreement_key: DisagreementKey,
    /// Agents that always get a (possibly all-zero) sentiment tally.
    pub agents: Vec<String>,
}

/// Everything derived from one pass over the corpus.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub consensus: Vec<ConsensusRecord>,
    pub recomputed: Recomputed,
    /// Disagreeing items by grouping key, highest count first.
    pub disagreements: Vec<(String, usize)>,
    /// Precomputed ranking, unmodified order, with local rating breakdowns.
    pub ranking: Vec<RankedAgent>,
    pub diagnostics: Diagnostics,
}

/// Agents to keep in the per-agent tallies: configured ones, ranked ones and
/// any named by the precomputed tally, in that order, without duplicates.
fn tally_agents(corpus: &Corpus, options: &AnalysisOptions) -> Vec<String> {
    let mut agents: Vec<String> = Vec::new();
    let candidates = options
        .agents
        .iter()
        .chain(corpus.results.agent_helpfulness_ranking.iter().map(|e| &e.agent))
        .chain(corpus.results.agent_sentiment.keys());

    for agent in candidates {
        if !agents.contains(agent) {
            agents.push(agent.clone());
        }
    }
    agents
}

/// Run the full consensus and aggregation pass.
pub fn analyze(corpus: &Corpus, options: &AnalysisOptions) -> Analysis {
    let pass = build_consensus(&corpus.im, &corpus.nn);
    let mut diagnostics = pass.diagnostics.clone();
    let records = &pass.records;
    info!(
        "Resolved {} items ({} unresolvable, {} missing counterparts)",
        records.len(),
        diagnostics.unresolvable.len(),
        diagnostics.missing_counterparts()
    );

    let agents = tally_agents(corpus, options);
    debug!("Tallying agents: {:?}", agents);

    let recomputed = Recomputed {
        total_items: records.len(),
        agreement_pct: agreement_pct(records),
        im_distribution: per_annotator_distribution(&pass.im),
        nn_distribution: per_annotator_distribution(&pass.nn),
        consensus_distribution: consensus_distribution(records),
        agent_sentiment: agent_sentiment_tally(records, &agents),
    };

    let disagreements = disagreement_tally(records, options.disagreement_key);

    let ranker = HelpfulnessRanker::new(
        &corpus.results.agent_helpfulness_ranking,
        pass.annotated_by(options.rating_source),
    );
    diagnostics.warnings.extend(ranker.validate());
    let ranking = ranker.annotated();

    diagnostics.mismatches = cross_check(&corpus.results, &recomputed);

    Analysis {
        consensus: pass.records,
        recomputed,
        disagreements,
        ranking,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentRankEntry, FeedbackItem, RatingBucket, Sentiment};

    fn item(id: &str, label: Sentiment, agents: &[&str]) -> FeedbackItem {
        FeedbackItem {
            related_agents_label: agents.iter().map(|a| a.to_string()).collect(),
            ..FeedbackItem::new(id, Some(label))
        }
    }

    fn corpus() -> Corpus {
        let mut im = vec![
            item("id1", Sentiment::Bug, &["ethics"]),
            item("id2", Sentiment::Positive, &["scope", "ethics"]),
        ];
        im[0]
            .agent_ratings
            .insert("ethics".to_string(), RatingBucket::NotAtAllHelpful);
        let nn = vec![
            item("id1", Sentiment::Negative, &[]),
            item("id2", Sentiment::Positive, &[]),
        ];

        let mut corpus = Corpus {
            im,
            nn,
            ..Corpus::default()
        };
        corpus.results.agent_helpfulness_ranking = vec![
            AgentRankEntry {
                agent: "scope".to_string(),
                avg_score: 2.5,
                positive_count: 1,
                negative_count: 0,
            },
            AgentRankEntry {
                agent: "ethics".to_string(),
                avg_score: 1.5,
                positive_count: 1,
                negative_count: 1,
            },
        ];
        corpus
    }

    #[test]
    fn test_analyze_end_to_end() {
        let options = AnalysisOptions {
            agents: vec!["novelty".to_string()],
            ..AnalysisOptions::default()
        };
        let analysis = analyze(&corpus(), &options);

        assert_eq!(analysis.consensus.len(), 2);
        assert_eq!(analysis.recomputed.consensus_distribution.bug, 1);
        assert_eq!(analysis.recomputed.consensus_distribution.positive, 1);
        assert_eq!(analysis.recomputed.agreement_pct, 50.0);
        assert_eq!(analysis.disagreements, vec![("bug".to_string(), 1)]);

        let tally = &analysis.recomputed.agent_sentiment;
        assert_eq!(tally["ethics"].bug, 1);
        assert_eq!(tally["ethics"].positive, 1);
        assert_eq!(tally["novelty"].total(), 0);

        // ranking order preserved even though it is not ascending
        assert_eq!(analysis.ranking[0].entry.agent, "scope");
        assert_eq!(analysis.ranking[1].ratings.not_at_all_helpful, 1);
        assert!(analysis
            .diagnostics
            .warnings
            .iter()
            .any(|w| w.contains("not ascending")));
    }

    #[test]
    fn test_analyze_flags_default_precomputed_as_mismatch() {
        let analysis = analyze(&corpus(), &AnalysisOptions::default());
        assert!(analysis
            .diagnostics
            .mismatches
            .iter()
            .any(|m| m.metric == "total_items"));
    }

    #[test]
    fn test_duplicate_records_counted_once() {
        let mut first = item("a", Sentiment::Bug, &["ethics"]);
        first
            .agent_ratings
            .insert("ethics".to_string(), RatingBucket::VeryHelpful);
        let mut second = item("a", Sentiment::Positive, &["ethics"]);
        second
            .agent_ratings
            .insert("ethics".to_string(), RatingBucket::NotApplicable);

        let mut corpus = Corpus {
            im: vec![first, second],
            nn: vec![item("a", Sentiment::Bug, &[])],
            ..Corpus::default()
        };
        corpus.results.agent_helpfulness_ranking = vec![AgentRankEntry {
            agent: "ethics".to_string(),
            avg_score: 1.5,
            positive_count: 0,
            negative_count: 0,
        }];

        let analysis = analyze(&corpus, &AnalysisOptions::default());
        let im = analysis.recomputed.im_distribution;

        assert_eq!(analysis.consensus.len(), 1);
        assert_eq!(im.total(), analysis.consensus.len());
        assert_eq!(im.bug, 1);
        assert_eq!(im.positive, 0);

        let ratings = analysis.ranking[0].ratings;
        assert_eq!(ratings.total(), 1);
        assert_eq!(ratings.very_helpful, 1);
        assert_eq!(analysis.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let corpus = corpus();
        let options = AnalysisOptions::default();
        let a = analyze(&corpus, &options);
        let b = analyze(&corpus, &options);

        assert_eq!(a.consensus, b.consensus);
        assert_eq!(a.recomputed, b.recomputed);
        assert_eq!(a.disagreements, b.disagreements);
        assert_eq!(a.ranking, b.ranking);
        assert_eq!(a.diagnostics, b.diagnostics);
    }
}
