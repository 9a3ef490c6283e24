//! Query engine: ranks verses against a free-text query.
//!
//! Scoring, for distinct query terms `Q` and a verse `v`:
//!
//! ```text
//! M(v)     = Q ∩ terms(v)
//! w(v)     = Σ_{t ∈ M(v)} idf(t) · (1 + ln tf(t, v))
//! score(v) = |M(v)| + w(v) / (1 + w(v))
//! ```
//!
//! The integer part counts matched distinct terms, so a verse covering more
//! of the query always ranks above one covering less. The fractional part
//! orders verses with equal coverage by term frequency and rarity. Equal
//! scores fall back to (chapter, verse) ascending.

use std::collections::{BTreeSet, HashMap};

use noor_store::Verse;
use tracing::debug;

use crate::index::{verse_terms, SearchIndex};
use crate::normalize::tokenize;
use crate::types::Match;

/// Ranks verses for a query using a prebuilt [`SearchIndex`].
#[derive(Debug, Clone)]
pub struct QueryEngine {
    top_k: usize,
}

impl QueryEngine {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank `verses` against `query`, best first, at most `top_k` results.
    ///
    /// `verses` is the current corpus. Verses missing from `index` (added after
    /// it was built) are tokenized here and scored with the index's statistics;
    /// indexed verses absent from `verses` are ignored.
    pub fn search(&self, query: &str, verses: &[Verse], index: &SearchIndex) -> Vec<Match> {
        let query = query.trim();
        if query.is_empty() || self.top_k == 0 {
            return Vec::new();
        }

        let terms: BTreeSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Vec::new();
        }

        // verse id -> (term, tf) for every query term, pushed in term order
        let mut hits: HashMap<&str, Vec<(&str, u32)>> = HashMap::new();
        for term in &terms {
            if let Some(postings) = index.postings(term) {
                for (verse_id, tf) in postings {
                    hits.entry(verse_id.as_str())
                        .or_default()
                        .push((term.as_str(), *tf));
                }
            }
        }

        let mut matches = Vec::new();
        let mut unindexed = 0usize;
        for verse in verses {
            let fresh;
            let matched: &[(&str, u32)] = if index.contains_verse(&verse.id) {
                match hits.get(verse.id.as_str()) {
                    Some(found) => found.as_slice(),
                    None => continue,
                }
            } else {
                unindexed += 1;
                let counts = verse_terms(verse);
                fresh = terms
                    .iter()
                    .filter_map(|t| counts.get(t).map(|tf| (t.as_str(), *tf)))
                    .collect::<Vec<_>>();
                fresh.as_slice()
            };

            if matched.is_empty() {
                continue;
            }

            matches.push(Match {
                verse: verse.clone(),
                score: score_terms(matched, index),
                matched_terms: matched.iter().map(|(t, _)| t.to_string()).collect(),
            });
        }

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.verse.position().cmp(&b.verse.position()))
        });
        matches.truncate(self.top_k);

        debug!(
            "Query {:?}: {} terms, {} matches, {} verses scored outside the index",
            query,
            terms.len(),
            matches.len(),
            unindexed
        );

        matches
    }
}

/// Score a verse from its matched `(term, tf)` pairs.
pub fn score_terms(matched: &[(&str, u32)], index: &SearchIndex) -> f64 {
    if matched.is_empty() {
        return 0.0;
    }
    let weight: f64 = matched
        .iter()
        .map(|(term, tf)| index.idf(term) * (1.0 + (*tf as f64).ln()))
        .sum();
    matched.len() as f64 + weight / (1.0 + weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse(chapter: u32, number: u32, original: &str, translation: &str) -> Verse {
        Verse {
            id: format!("{}:{}", chapter, number),
            chapter_number: chapter,
            verse_number: number,
            text_original: original.to_string(),
            text_translation: Some(translation.to_string()),
            page_number: Some(1),
            juz_number: Some(1),
        }
    }

    fn corpus() -> Vec<Verse> {
        vec![
            verse(1, 1, "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ", "In the name of Allah, the Most Merciful"),
            verse(1, 2, "الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ", "All praise is due to Allah, Lord of the worlds"),
            verse(1, 3, "الرَّحْمَٰنِ الرَّحِيمِ", "The Most Merciful, the Especially Merciful"),
            verse(2, 2, "ذَٰلِكَ الْكِتَابُ", "This is the Book about which there is no doubt"),
        ]
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        let engine = QueryEngine::new(10);
        assert!(engine.search("", &verses, &index).is_empty());
        assert!(engine.search("   \t", &verses, &index).is_empty());
        assert!(engine.search("?!", &verses, &index).is_empty());
    }

    #[test]
    fn test_no_overlap_returns_nothing() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("xyzxyz-nonexistent-qwerty", &verses, &index);
        assert!(results.is_empty());
    }

    #[test]
    fn test_more_distinct_terms_rank_higher() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("Allah merciful", &verses, &index);
        assert_eq!(results[0].verse.id, "1:1");
        assert_eq!(results[0].matched_terms, vec!["allah", "merciful"]);
        assert!(results.iter().all(|m| m.score > 0.0));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_frequency_breaks_equal_coverage() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        // 1:3 says "merciful" twice, 1:1 once.
        let results = QueryEngine::new(10).search("merciful", &verses, &index);
        let ids: Vec<_> = results.iter().map(|m| m.verse.id.as_str()).collect();
        assert_eq!(ids, vec!["1:3", "1:1"]);
    }

    #[test]
    fn test_ties_ordered_by_position() {
        let verses = vec![
            verse(3, 1, "x", "light"),
            verse(1, 5, "y", "light"),
            verse(1, 2, "z", "light"),
        ];
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("light", &verses, &index);
        let positions: Vec<_> = results.iter().map(|m| m.verse.position()).collect();
        assert_eq!(positions, vec![(1, 2), (1, 5), (3, 1)]);
        assert_eq!(results[0].score, results[2].score);
    }

    #[test]
    fn test_top_k_cap() {
        let verses: Vec<_> = (1..=25).map(|n| verse(2, n, "x", "guidance")).collect();
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("guidance", &verses, &index);
        assert_eq!(results.len(), 10);
        assert_eq!(results[9].verse.verse_number, 10);
        assert!(QueryEngine::new(0).search("guidance", &verses, &index).is_empty());
    }

    #[test]
    fn test_arabic_query_without_diacritics() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("الرحيم", &verses, &index);
        let ids: Vec<_> = results.iter().map(|m| m.verse.id.as_str()).collect();
        assert_eq!(ids, vec!["1:1", "1:3"]);
    }

    #[test]
    fn test_plain_query_matches_uthmani_small_letters() {
        let verses = vec![verse(2, 37, "إِنَّهُۥ هُوَ ٱلتَّوَّابُ ٱلرَّحِيمُ", "Indeed, it is He who is the Accepting of repentance")];
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("انه التواب", &verses, &index);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_terms, vec!["التواب", "انه"]);
    }

    #[test]
    fn test_stale_index_still_sees_new_verses() {
        let mut verses = corpus();
        let index = SearchIndex::build(&verses);
        verses.push(verse(114, 1, "قُلْ أَعُوذُ بِرَبِّ النَّاسِ", "Say, I seek refuge in the Lord of mankind"));

        let results = QueryEngine::new(10).search("refuge", &verses, &index);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].verse.id, "114:1");
    }

    #[test]
    fn test_indexed_verses_missing_from_corpus_are_skipped() {
        let verses = corpus();
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search("Allah", &verses[2..], &index);
        assert!(results.is_empty());
    }

    #[test]
    fn test_score_terms_formula() {
        let index = SearchIndex::build(&[verse(1, 1, "a", "light")]);
        assert_eq!(score_terms(&[], &index), 0.0);
        let idf = (1.0f64 + 1.0).ln();
        let expected = 1.0 + idf / (1.0 + idf);
        assert!((score_terms(&[("light", 1)], &index) - expected).abs() < 1e-12);
    }
}
