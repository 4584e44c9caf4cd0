//! Consensus resolution between the two annotators.
//!
//! When the annotators disagree the more severe label wins, so that a
//! `bug` or `negative` reading is surfaced rather than averaged away.

use crate::error::{AnalyticsError, AnalyticsResult, Annotator};
use crate::models::{ConsensusRecord, Diagnostics, FeedbackItem, Sentiment};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The two records sharing an `item_id`. Either side may be missing.
#[derive(Debug, Clone, Copy)]
pub struct AnnotatorLabelPair<'a> {
    pub item_id: &'a str,
    pub im: Option<&'a FeedbackItem>,
    pub nn: Option<&'a FeedbackItem>,
}

impl AnnotatorLabelPair<'_> {
    pub fn im_label(&self) -> Option<Sentiment> {
        self.im.and_then(|item| item.sentiment_label)
    }

    pub fn nn_label(&self) -> Option<Sentiment> {
        self.nn.and_then(|item| item.sentiment_label)
    }

    /// NN's attribution when it names any agent, otherwise IM's.
    pub fn related_agents(&self) -> Vec<String> {
        match self.nn {
            Some(nn) if !nn.related_agents_label.is_empty() => nn.related_agents_label.clone(),
            _ => self
                .im
                .map(|im| im.related_agents_label.clone())
                .unwrap_or_default(),
        }
    }

    fn feedback_text(&self) -> String {
        self.im
            .or(self.nn)
            .map(|item| item.feedback_text.clone())
            .unwrap_or_default()
    }
}

/// Merge two labels into `(consensus_label, agrees)`.
///
/// A single available label is taken as-is and counts as agreeing. Two
/// different labels resolve to the one with the lower severity rank.
pub fn resolve_labels(
    item_id: &str,
    im: Option<Sentiment>,
    nn: Option<Sentiment>,
) -> AnalyticsResult<(Sentiment, bool)> {
    match (im, nn) {
        (Some(a), Some(b)) if a == b => Ok((a, true)),
        (Some(a), Some(b)) => {
            let winner = if a.severity() < b.severity() { a } else { b };
            Ok((winner, false))
        }
        (Some(only), None) | (None, Some(only)) => Ok((only, true)),
        (None, None) => Err(AnalyticsError::NoLabelAvailable {
            item_id: item_id.to_string(),
        }),
    }
}

/// Resolve one pair into a [`ConsensusRecord`].
pub fn resolve(pair: &AnnotatorLabelPair<'_>) -> AnalyticsResult<ConsensusRecord> {
    let im_label = pair.im_label();
    let nn_label = pair.nn_label();
    let (consensus_label, agrees) = resolve_labels(pair.item_id, im_label, nn_label)?;

    Ok(ConsensusRecord {
        item_id: pair.item_id.to_string(),
        im_label,
        nn_label,
        consensus_label,
        agrees,
        related_agents: pair.related_agents(),
        feedback_text: pair.feedback_text(),
    })
}

/// Output of a consensus pass over both record sets.
#[derive(Debug, Clone, Default)]
pub struct ConsensusPass {
    pub records: Vec<ConsensusRecord>,
    /// IM's records with duplicate ids removed, first record kept.
    pub im: Vec<FeedbackItem>,
    /// NN's records with duplicate ids removed, first record kept.
    pub nn: Vec<FeedbackItem>,
    pub diagnostics: Diagnostics,
}

impl ConsensusPass {
    /// One annotator's deduplicated record set.
    pub fn annotated_by(&self, annotator: Annotator) -> &[FeedbackItem] {
        match annotator {
            Annotator::Im => &self.im,
            Annotator::Nn => &self.nn,
        }
    }
}

/// Index one annotator's records by id, keeping the first of any duplicates.
fn index_records<'a>(
    records: &'a [FeedbackItem],
    annotator: Annotator,
    diagnostics: &mut Diagnostics,
) -> (Vec<&'a str>, HashMap<&'a str, &'a FeedbackItem>) {
    let mut order = Vec::with_capacity(records.len());
    let mut index = HashMap::with_capacity(records.len());

    for item in records {
        if index.contains_key(item.item_id.as_str()) {
            let msg = format!(
                "duplicate item {} in {} record set; keeping the first",
                item.item_id, annotator
            );
            warn!("{}", msg);
            diagnostics.warnings.push(msg);
            continue;
        }
        index.insert(item.item_id.as_str(), item);
        order.push(item.item_id.as_str());
    }

    (order, index)
}

fn kept_records(order: &[&str], index: &HashMap<&str, &FeedbackItem>) -> Vec<FeedbackItem> {
    order
        .iter()
        .filter_map(|id| index.get(id).map(|item| (*item).clone()))
        .collect()
}

/// Pair up both record sets and resolve every item.
///
/// Items are visited in IM order, followed by NN-only items in NN order.
/// Missing counterparts and unresolvable items are tolerated and recorded in
/// the returned diagnostics.
pub fn build_consensus(im: &[FeedbackItem], nn: &[FeedbackItem]) -> ConsensusPass {
    let mut diagnostics = Diagnostics::default();
    let (im_order, im_index) = index_records(im, Annotator::Im, &mut diagnostics);
    let (nn_order, nn_index) = index_records(nn, Annotator::Nn, &mut diagnostics);

    let ids = im_order
        .iter()
        .copied()
        .chain(nn_order.iter().copied().filter(|id| !im_index.contains_key(id)));

    let mut records = Vec::with_capacity(im_order.len().max(nn_order.len()));

    for item_id in ids {
        let pair = AnnotatorLabelPair {
            item_id,
            im: im_index.get(item_id).copied(),
            nn: nn_index.get(item_id).copied(),
        };

        match (pair.im.is_some(), pair.nn.is_some()) {
            (true, false) => {
                debug!(
                    "{}",
                    AnalyticsError::MissingCounterpart {
                        item_id: item_id.to_string(),
                        present_in: Annotator::Im,
                    }
                );
                diagnostics.im_only.push(item_id.to_string());
            }
            (false, true) => {
                debug!(
                    "{}",
                    AnalyticsError::MissingCounterpart {
                        item_id: item_id.to_string(),
                        present_in: Annotator::Nn,
                    }
                );
                diagnostics.nn_only.push(item_id.to_string());
            }
            _ => {}
        }

        match resolve(&pair) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("{}", e);
                diagnostics.unresolvable.push(item_id.to_string());
            }
        }
    }

    if diagnostics.missing_counterparts() > 0 {
        warn!(
            "{} items lack a counterpart (IM only: {}, NN only: {})",
            diagnostics.missing_counterparts(),
            diagnostics.im_only.len(),
            diagnostics.nn_only.len()
        );
    }

    ConsensusPass {
        records,
        im: kept_records(&im_order, &im_index),
        nn: kept_records(&nn_order, &nn_index),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Sentiment::*;

    fn item(id: &str, label: Option<Sentiment>, agents: &[&str]) -> FeedbackItem {
        FeedbackItem {
            related_agents_label: agents.iter().map(|a| a.to_string()).collect(),
            ..FeedbackItem::new(id, label)
        }
    }

    #[test]
    fn test_identical_labels_agree() {
        for s in Sentiment::ALL {
            assert_eq!(resolve_labels("x", Some(s), Some(s)), Ok((s, true)));
        }
    }

    #[test]
    fn test_differing_labels_pick_more_severe() {
        for a in Sentiment::ALL {
            for b in Sentiment::ALL {
                if a == b {
                    continue;
                }
                let (label, agrees) = resolve_labels("x", Some(a), Some(b)).unwrap();
                assert!(!agrees);
                assert_eq!(label.severity(), a.severity().min(b.severity()));
                // symmetric in argument order
                assert_eq!(resolve_labels("x", Some(b), Some(a)), Ok((label, false)));
            }
        }
        assert_eq!(resolve_labels("x", Some(Neutral), Some(Bug)), Ok((Bug, false)));
    }

    #[test]
    fn test_single_label_agrees_by_convention() {
        assert_eq!(resolve_labels("x", Some(Neutral), None), Ok((Neutral, true)));
        assert_eq!(resolve_labels("x", None, Some(Bug)), Ok((Bug, true)));
    }

    #[test]
    fn test_no_label_is_an_error() {
        assert_eq!(
            resolve_labels("orphan", None, None),
            Err(AnalyticsError::NoLabelAvailable {
                item_id: "orphan".to_string()
            })
        );
    }

    #[test]
    fn test_end_to_end_example() {
        let im = vec![item("id1", Some(Bug), &[]), item("id2", Some(Positive), &[])];
        let nn = vec![
            item("id1", Some(Negative), &[]),
            item("id2", Some(Positive), &[]),
        ];

        let pass = build_consensus(&im, &nn);
        assert_eq!(pass.records.len(), 2);
        assert_eq!(pass.records[0].item_id, "id1");
        assert_eq!(pass.records[0].consensus_label, Bug);
        assert!(!pass.records[0].agrees);
        assert_eq!(pass.records[1].consensus_label, Positive);
        assert!(pass.records[1].agrees);
        assert!(pass.diagnostics.is_clean());
    }

    #[test]
    fn test_missing_counterparts_are_counted() {
        let im = vec![item("a", Some(Neutral), &[]), item("b", Some(Bug), &[])];
        let nn = vec![item("b", Some(Bug), &[]), item("c", Some(Negative), &[])];

        let pass = build_consensus(&im, &nn);
        let ids: Vec<_> = pass.records.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(pass.diagnostics.im_only, vec!["a"]);
        assert_eq!(pass.diagnostics.nn_only, vec!["c"]);
        assert!(pass.records.iter().all(|r| r.agrees));
        assert_eq!(pass.records[2].consensus_label, Negative);
    }

    #[test]
    fn test_unresolvable_items_are_reported_not_defaulted() {
        let im = vec![item("a", None, &[]), item("b", Some(Positive), &[])];
        let nn = vec![item("a", None, &[]), item("b", Some(Positive), &[])];

        let pass = build_consensus(&im, &nn);
        assert_eq!(pass.records.len(), 1);
        assert_eq!(pass.diagnostics.unresolvable, vec!["a"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let im = vec![item("a", Some(Positive), &[]), item("a", Some(Bug), &[])];
        let nn = vec![item("a", Some(Positive), &[])];

        let pass = build_consensus(&im, &nn);
        assert_eq!(pass.records.len(), 1);
        assert_eq!(pass.records[0].consensus_label, Positive);
        assert_eq!(pass.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_dropped_from_record_sets() {
        let im = vec![
            item("a", Some(Bug), &[]),
            item("a", Some(Positive), &[]),
            item("b", Some(Neutral), &[]),
        ];
        let nn = vec![item("a", Some(Bug), &[]), item("a", Some(Neutral), &[])];

        let pass = build_consensus(&im, &nn);
        let im_ids: Vec<_> = pass.im.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(im_ids, vec!["a", "b"]);
        assert_eq!(pass.im[0].sentiment_label, Some(Bug));
        assert_eq!(pass.annotated_by(Annotator::Nn).len(), 1);
        assert_eq!(pass.nn[0].sentiment_label, Some(Bug));
        assert_eq!(pass.diagnostics.warnings.len(), 2);
    }

    #[test]
    fn test_related_agents_prefer_nn() {
        let im = vec![
            item("a", Some(Negative), &["ethics"]),
            item("b", Some(Negative), &["scope"]),
        ];
        let nn = vec![
            item("a", Some(Negative), &["novelty", "integrity"]),
            item("b", Some(Negative), &[]),
        ];

        let pass = build_consensus(&im, &nn);
        assert_eq!(pass.records[0].related_agents, vec!["novelty", "integrity"]);
        assert_eq!(pass.records[1].related_agents, vec!["scope"]);
    }

    #[test]
    fn test_rerun_is_identical() {
        let im = vec![item("a", Some(Neutral), &["x"]), item("b", Some(Bug), &[])];
        let nn = vec![item("a", Some(Negative), &["y"]), item("c", None, &[])];

        let first = build_consensus(&im, &nn);
        let second = build_consensus(&im, &nn);
        assert_eq!(first.records, second.records);
        assert_eq!(first.diagnostics, second.diagnostics);
    }
}
