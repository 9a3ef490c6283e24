//! In-memory inverted index over the verse corpus.
//!
//! Built in one pass from the full verse list and never updated in place;
//! a refresh means building a new index and swapping it in.

use std::collections::{BTreeMap, HashMap, HashSet};

use noor_store::Verse;

use crate::normalize::term_counts;

/// Postings for one term: verse id → term frequency in that verse.
pub type Postings = BTreeMap<String, u32>;

/// Inverted index from normalized term to the verses containing it.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    terms: HashMap<String, Postings>,
    verse_ids: HashSet<String>,
}

impl SearchIndex {
    /// Build an index over `verses`.
    ///
    /// Each verse contributes the terms of its original text and its
    /// translation. The result does not depend on input order.
    pub fn build(verses: &[Verse]) -> Self {
        let mut index = Self::default();

        for verse in verses {
            if !index.verse_ids.insert(verse.id.clone()) {
                continue;
            }
            for (term, tf) in verse_terms(verse) {
                index
                    .terms
                    .entry(term)
                    .or_default()
                    .insert(verse.id.clone(), tf);
            }
        }

        index
    }

    /// Number of verses the index was built from.
    pub fn doc_count(&self) -> usize {
        self.verse_ids.len()
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verse_ids.is_empty()
    }

    /// Whether the verse was part of the corpus at build time.
    pub fn contains_verse(&self, verse_id: &str) -> bool {
        self.verse_ids.contains(verse_id)
    }

    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.terms.get(term)
    }

    /// Number of indexed verses containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map(BTreeMap::len).unwrap_or(0)
    }

    /// Inverse document frequency: `ln(1 + N / df)`.
    ///
    /// `N` and `df` are clamped to at least 1, so a term the index has never
    /// seen (a verse added after the build) gets the highest weight.
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.doc_count().max(1) as f64;
        let df = self.document_frequency(term).max(1) as f64;
        (1.0 + n / df).ln()
    }
}

/// Term frequencies of a verse's searchable text.
pub fn verse_terms(verse: &Verse) -> HashMap<String, u32> {
    term_counts(
        std::iter::once(verse.text_original.as_str()).chain(verse.text_translation.as_deref()),
    )
}
