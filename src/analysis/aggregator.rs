//! Sentiment and rating tallies.
//!
//! Every function here is a single full pass over its input. Results are
//! keyed by `BTreeMap` so repeated runs produce identical output.

use crate::models::{ConsensusRecord, FeedbackItem, RatingCounts, Sentiment, SentimentCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count sentiment labels in one annotator's record set.
///
/// Records without a label are skipped.
pub fn per_annotator_distribution(records: &[FeedbackItem]) -> SentimentCounts {
    let mut counts = SentimentCounts::default();

    for label in records.iter().filter_map(|r| r.sentiment_label) {
        counts.increment(label);
    }

    counts
}

/// Count consensus labels. Totals equal the number of resolved items.
pub fn consensus_distribution(records: &[ConsensusRecord]) -> SentimentCounts {
    let mut counts = SentimentCounts::default();

    for record in records {
        counts.increment(record.consensus_label);
    }

    counts
}

/// Per-agent counts of consensus sentiment.
///
/// An item naming several agents is counted once for each of them, so the
/// per-agent totals may add up to more than the number of items. Every agent
/// in `agents` gets an entry, all zero if no item mentions it.
pub fn agent_sentiment_tally(
    records: &[ConsensusRecord],
    agents: &[String],
) -> BTreeMap<String, SentimentCounts> {
    let mut tally: BTreeMap<String, SentimentCounts> = agents
        .iter()
        .map(|agent| (agent.clone(), SentimentCounts::default()))
        .collect();

    for record in records {
        for agent in &record.related_agents {
            tally
                .entry(agent.clone())
                .or_default()
                .increment(record.consensus_label);
        }
    }

    tally
}

/// Per-agent counts of rating buckets from one annotator's records.
///
/// Only the requested agents are tallied. An item without a rating for an
/// agent contributes to none of that agent's buckets.
pub fn rating_bucket_tally(
    records: &[FeedbackItem],
    agents: &[String],
) -> BTreeMap<String, RatingCounts> {
    let mut tally: BTreeMap<String, RatingCounts> = agents
        .iter()
        .map(|agent| (agent.clone(), RatingCounts::default()))
        .collect();

    for record in records {
        for (agent, counts) in tally.iter_mut() {
            if let Some(bucket) = record.agent_ratings.get(agent) {
                counts.increment(*bucket);
            }
        }
    }

    tally
}

/// How disagreeing items are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisagreementKey {
    /// Group by the resolved consensus category
    #[default]
    Consensus,
    /// Group by the two labels, most severe first (e.g. "bug vs negative")
    Pair,
}

impl DisagreementKey {
    fn key_for(self, record: &ConsensusRecord) -> Option<String> {
        match self {
            DisagreementKey::Consensus => Some(record.consensus_label.as_str().to_string()),
            DisagreementKey::Pair => {
                let (a, b) = (record.im_label?, record.nn_label?);
                let (first, second) = if a <= b { (a, b) } else { (b, a) };
                Some(format!("{} vs {}", first.as_str(), second.as_str()))
            }
        }
    }
}

/// Count disagreeing items by `key`, highest count first.
///
/// Ties are broken by key so the order is stable.
pub fn disagreement_tally(records: &[ConsensusRecord], key: DisagreementKey) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.agrees) {
        if let Some(k) = key.key_for(record) {
            *counts.entry(k).or_default() += 1;
        }
    }

    sort_desc(counts)
}

/// Percentage (one decimal) of double-annotated items on which both agree.
pub fn agreement_pct(records: &[ConsensusRecord]) -> f64 {
    let both: Vec<_> = records.iter().filter(|r| r.double_annotated()).collect();
    if both.is_empty() {
        return 0.0;
    }

    let agreeing = both.iter().filter(|r| r.agrees).count();
    let pct = agreeing as f64 / both.len() as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Consensus items of one category, in stream order, capped at `limit`.
pub fn items_with_label(
    records: &[ConsensusRecord],
    label: Sentiment,
    limit: usize,
) -> Vec<&ConsensusRecord> {
    records
        .iter()
        .filter(|r| r.consensus_label == label)
        .take(limit)
        .collect()
}

/// Sort a count map descending by count, then ascending by key.
pub fn sort_desc<K: Ord>(counts: impl IntoIterator<Item = (K, usize)>) -> Vec<(K, usize)> {
    let mut sorted: Vec<(K, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingBucket;
    use Sentiment::*;

    fn record(
        id: &str,
        im: Option<Sentiment>,
        nn: Option<Sentiment>,
        consensus: Sentiment,
        agents: &[&str],
    ) -> ConsensusRecord {
        ConsensusRecord {
            item_id: id.to_string(),
            im_label: im,
            nn_label: nn,
            consensus_label: consensus,
            agrees: im.is_none() || nn.is_none() || im == nn,
            related_agents: agents.iter().map(|a| a.to_string()).collect(),
            feedback_text: String::new(),
        }
    }

    fn rated(id: &str, ratings: &[(&str, RatingBucket)]) -> FeedbackItem {
        FeedbackItem {
            agent_ratings: ratings
                .iter()
                .map(|(agent, bucket)| (agent.to_string(), *bucket))
                .collect(),
            ..FeedbackItem::new(id, Some(Neutral))
        }
    }

    fn names(agents: &[&str]) -> Vec<String> {
        agents.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_per_annotator_distribution_skips_unlabelled() {
        let records = vec![
            FeedbackItem::new("a", Some(Bug)),
            FeedbackItem::new("b", Some(Bug)),
            FeedbackItem::new("c", Some(Positive)),
            FeedbackItem::new("d", None),
        ];

        let counts = per_annotator_distribution(&records);
        assert_eq!(counts.bug, 2);
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_consensus_distribution_sums_to_items() {
        let records = vec![
            record("id1", Some(Bug), Some(Negative), Bug, &[]),
            record("id2", Some(Positive), Some(Positive), Positive, &[]),
        ];

        let counts = consensus_distribution(&records);
        assert_eq!(
            counts,
            SentimentCounts {
                positive: 1,
                neutral: 0,
                negative: 0,
                bug: 1
            }
        );
        assert_eq!(counts.total(), records.len());
    }

    #[test]
    fn test_agent_sentiment_fan_out() {
        let records = vec![
            record("a", Some(Negative), Some(Negative), Negative, &["ethics", "scope"]),
            record("b", Some(Positive), Some(Positive), Positive, &["ethics", "scope", "novelty"]),
        ];

        let tally = agent_sentiment_tally(&records, &names(&["ethics", "integrity"]));

        assert_eq!(tally["ethics"].negative, 1);
        assert_eq!(tally["ethics"].positive, 1);
        assert_eq!(tally["scope"].total(), 2);
        assert_eq!(tally["novelty"].positive, 1);

        let summed: usize = tally.values().map(|c| c.total()).sum();
        assert!(summed > records.len());
    }

    #[test]
    fn test_agent_sentiment_unmentioned_agent_is_zero() {
        let records = vec![record("a", Some(Bug), None, Bug, &["scope"])];
        let tally = agent_sentiment_tally(&records, &names(&["integrity"]));

        assert_eq!(tally.get("integrity"), Some(&SentimentCounts::default()));
    }

    #[test]
    fn test_rating_bucket_tally_single_rating() {
        let records = vec![rated("a", &[("ethics", RatingBucket::VeryHelpful)])];

        let tally = rating_bucket_tally(&records, &names(&["ethics"]));
        assert_eq!(tally.len(), 1);
        let ethics = tally["ethics"];
        assert_eq!(ethics.very_helpful, 1);
        for bucket in RatingBucket::ALL.into_iter().skip(1) {
            assert_eq!(ethics.get(bucket), 0);
        }
    }

    #[test]
    fn test_rating_bucket_totals_match_rated_items() {
        let records = vec![
            rated("a", &[("scope", RatingBucket::NotApplicable), ("ethics", RatingBucket::SlightlyHelpful)]),
            rated("b", &[("scope", RatingBucket::NotAtAllHelpful)]),
            rated("c", &[]),
            rated("d", &[("scope", RatingBucket::NotAtAllHelpful)]),
        ];

        let tally = rating_bucket_tally(&records, &names(&["scope", "ethics", "novelty"]));

        assert_eq!(tally["scope"].total(), 3);
        assert_eq!(tally["scope"].not_at_all_helpful, 2);
        assert_eq!(tally["ethics"].total(), 1);
        assert_eq!(tally["novelty"].total(), 0);
    }

    #[test]
    fn test_disagreement_tally_by_consensus() {
        let records = vec![
            record("a", Some(Bug), Some(Negative), Bug, &[]),
            record("b", Some(Neutral), Some(Negative), Negative, &[]),
            record("c", Some(Positive), Some(Negative), Negative, &[]),
            record("d", Some(Positive), Some(Positive), Positive, &[]),
        ];

        let tally = disagreement_tally(&records, DisagreementKey::Consensus);
        assert_eq!(
            tally,
            vec![("negative".to_string(), 2), ("bug".to_string(), 1)]
        );
    }

    #[test]
    fn test_disagreement_tally_by_pair() {
        let records = vec![
            record("a", Some(Negative), Some(Bug), Bug, &[]),
            record("b", Some(Bug), Some(Negative), Bug, &[]),
            record("c", Some(Positive), Some(Neutral), Neutral, &[]),
        ];

        let tally = disagreement_tally(&records, DisagreementKey::Pair);
        assert_eq!(tally[0], ("bug vs negative".to_string(), 2));
        assert_eq!(tally[1], ("neutral vs positive".to_string(), 1));
    }

    #[test]
    fn test_agreement_pct_ignores_single_annotated() {
        let records = vec![
            record("a", Some(Bug), Some(Negative), Bug, &[]),
            record("b", Some(Positive), Some(Positive), Positive, &[]),
            record("c", Some(Positive), Some(Positive), Positive, &[]),
            record("d", Some(Neutral), None, Neutral, &[]),
        ];

        assert_eq!(agreement_pct(&records), 66.7);
        assert_eq!(agreement_pct(&[]), 0.0);
    }

    #[test]
    fn test_items_with_label_caps() {
        let records: Vec<_> = (0..5)
            .map(|i| record(&i.to_string(), Some(Negative), None, Negative, &[]))
            .collect();

        let picked = items_with_label(&records, Negative, 3);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].item_id, "0");
        assert!(items_with_label(&records, Bug, 3).is_empty());
    }

    #[test]
    fn test_sort_desc_breaks_ties_by_key() {
        let sorted = sort_desc(vec![("b", 2), ("a", 2), ("c", 5)]);
        assert_eq!(sorted, vec![("c", 5), ("a", 2), ("b", 2)]);
    }
}
