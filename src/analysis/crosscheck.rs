//! Comparison of precomputed aggregates against local recomputation.

use crate::models::{AnalysisResults, Mismatch, Sentiment, SentimentCounts};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Largest agreement percentage difference treated as rounding noise.
const AGREEMENT_TOLERANCE: f64 = 0.1;

/// Locally recomputed figures mirroring the precomputed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recomputed {
    pub total_items: usize,
    pub agreement_pct: f64,
    pub im_distribution: SentimentCounts,
    pub nn_distribution: SentimentCounts,
    pub consensus_distribution: SentimentCounts,
    pub agent_sentiment: BTreeMap<String, SentimentCounts>,
}

fn compare_counts(
    metric: &str,
    precomputed: &SentimentCounts,
    recomputed: &SentimentCounts,
    out: &mut Vec<Mismatch>,
) {
    for sentiment in Sentiment::ALL {
        let (p, r) = (precomputed.get(sentiment), recomputed.get(sentiment));
        if p != r {
            out.push(Mismatch {
                metric: metric.to_string(),
                key: sentiment.as_str().to_string(),
                precomputed: p.to_string(),
                recomputed: r.to_string(),
            });
        }
    }
}

/// List every figure where the precomputed document and the recount differ.
///
/// Agents missing on one side are compared against zero counts.
pub fn cross_check(precomputed: &AnalysisResults, recomputed: &Recomputed) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    let ia = &precomputed.inter_annotator;

    if ia.total_items != recomputed.total_items {
        mismatches.push(Mismatch {
            metric: "total_items".to_string(),
            key: "all".to_string(),
            precomputed: ia.total_items.to_string(),
            recomputed: recomputed.total_items.to_string(),
        });
    }

    if (ia.agreement_pct - recomputed.agreement_pct).abs() > AGREEMENT_TOLERANCE {
        mismatches.push(Mismatch {
            metric: "agreement_pct".to_string(),
            key: "all".to_string(),
            precomputed: format!("{:.1}", ia.agreement_pct),
            recomputed: format!("{:.1}", recomputed.agreement_pct),
        });
    }

    compare_counts(
        "im_distribution",
        &ia.im_distribution,
        &recomputed.im_distribution,
        &mut mismatches,
    );
    compare_counts(
        "nn_distribution",
        &ia.nn_distribution,
        &recomputed.nn_distribution,
        &mut mismatches,
    );
    compare_counts(
        "consensus_distribution",
        &precomputed.consensus_distribution,
        &recomputed.consensus_distribution,
        &mut mismatches,
    );

    let mut agents: Vec<&String> = precomputed
        .agent_sentiment
        .keys()
        .chain(recomputed.agent_sentiment.keys())
        .collect();
    agents.sort();
    agents.dedup();

    for agent in agents {
        let p = precomputed
            .agent_sentiment
            .get(agent)
            .copied()
            .unwrap_or_default();
        let r = recomputed
            .agent_sentiment
            .get(agent)
            .copied()
            .unwrap_or_default();
        compare_counts(&format!("agent_sentiment.{}", agent), &p, &r, &mut mismatches);
    }

    for (agent, &count) in &precomputed.bug_analysis.by_agent {
        let r = recomputed
            .agent_sentiment
            .get(agent)
            .map(|c| c.bug)
            .unwrap_or_default();
        if count != r {
            mismatches.push(Mismatch {
                metric: "bug_analysis.by_agent".to_string(),
                key: agent.clone(),
                precomputed: count.to_string(),
                recomputed: r.to_string(),
            });
        }
    }

    for mismatch in &mismatches {
        warn!("Precomputed figure differs: {}", mismatch);
    }

    mismatches
}
