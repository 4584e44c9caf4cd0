//! Error taxonomy for the consensus and aggregation passes.
//!
//! Structural errors ([`AnalyticsError::UnknownCategory`]) abort the pass that
//! hits them. Completeness problems (`NoLabelAvailable`, `MissingCounterpart`)
//! are tolerated per item and accumulated into [`crate::models::Diagnostics`].

use std::fmt;

/// Which closed vocabulary a value was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Sentiment,
    RatingBucket,
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vocabulary::Sentiment => write!(f, "sentiment"),
            Vocabulary::RatingBucket => write!(f, "rating bucket"),
        }
    }
}

/// Annotator whose record set is being read.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Annotator {
    /// Annotator IM
    #[default]
    Im,
    /// Annotator NN
    Nn,
}

impl fmt::Display for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotator::Im => write!(f, "IM"),
            Annotator::Nn => write!(f, "NN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("unknown {vocabulary} value {value:?}{}", item_suffix(.item_id))]
    UnknownCategory {
        vocabulary: Vocabulary,
        value: String,
        item_id: Option<String>,
    },

    #[error("no sentiment label from either annotator for item {item_id}")]
    NoLabelAvailable { item_id: String },

    #[error("item {item_id} only present in {present_in} record set")]
    MissingCounterpart {
        item_id: String,
        present_in: Annotator,
    },
}

fn item_suffix(item_id: &Option<String>) -> String {
    match item_id {
        Some(id) => format!(" (item {})", id),
        None => String::new(),
    }
}

impl AnalyticsError {
    /// Attach the offending item id to an `UnknownCategory` error.
    pub fn for_item(self, id: &str) -> Self {
        match self {
            AnalyticsError::UnknownCategory {
                vocabulary, value, ..
            } => AnalyticsError::UnknownCategory {
                vocabulary,
                value,
                item_id: Some(id.to_string()),
            },
            other => other,
        }
    }
}

pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;
