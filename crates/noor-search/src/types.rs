//! Search result and answer types.

use noor_store::{CitationMetadata, Verse};
use serde::{Deserialize, Serialize};

/// Answer returned when no verse shares a term with the query.
pub const NO_RESULTS_ANSWER: &str = "No relevant results found.";

/// A verse ranked for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub verse: Verse,
    pub score: f64,
    /// Distinct normalized query terms found in the verse, sorted.
    pub matched_terms: Vec<String>,
}

/// A cited verse in the caller-facing answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub resource_id: String,
    pub metadata: CitationMetadata,
}

impl From<&Match> for Reference {
    fn from(m: &Match) -> Self {
        Self {
            resource_id: m.verse.id.clone(),
            metadata: CitationMetadata::from(&m.verse),
        }
    }
}

/// Caller-facing search response: `{ answer, references }`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchAnswer {
    pub answer: String,
    pub references: Vec<Reference>,
    /// Question recorded for this answer, when one was stored.
    #[serde(skip)]
    pub question_id: Option<String>,
}

impl SearchAnswer {
    /// The fixed "no relevant results" answer.
    pub fn no_results(question_id: Option<String>) -> Self {
        Self {
            answer: NO_RESULTS_ANSWER.to_string(),
            references: Vec::new(),
            question_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Snapshot of the memoized index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatus {
    pub built: bool,
    pub indexed_verses: usize,
    pub vocabulary_size: usize,
}
