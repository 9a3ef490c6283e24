//! Property tests for ranking: ordering, determinism, and coverage monotonicity.

use noor_search::{QueryEngine, SearchIndex};
use noor_store::Verse;
use proptest::prelude::*;

const VOCAB: &[&str] = &[
    "mercy", "light", "guidance", "patience", "prayer", "book", "lord", "day", "earth", "heaven",
];

fn corpus_strategy() -> impl Strategy<Value = Vec<Verse>> {
    prop::collection::vec(
        prop::collection::vec(prop::sample::select(VOCAB), 1..8),
        0..24,
    )
    .prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, words)| Verse {
                id: format!("v{}", i),
                chapter_number: (i / 5 + 1) as u32,
                verse_number: (i % 5 + 1) as u32,
                text_original: words.join(" "),
                text_translation: None,
                page_number: None,
                juz_number: None,
            })
            .collect()
    })
}

fn query_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCAB), 1..4).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn results_sorted_by_score_then_position(verses in corpus_strategy(), query in query_strategy()) {
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search(&query, &verses, &index);
        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].verse.position() < pair[1].verse.position());
            }
        }
        prop_assert!(results.iter().all(|m| m.score > 0.0));
        prop_assert!(results.len() <= 10);
    }

    #[test]
    fn shared_term_yields_results(verses in corpus_strategy(), query in query_strategy()) {
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(10).search(&query, &verses, &index);
        let overlaps = verses.iter().any(|v| {
            query.split(' ').any(|q| v.text_original.split(' ').any(|w| w == q))
        });
        prop_assert_eq!(overlaps, !results.is_empty());
    }

    #[test]
    fn search_is_deterministic(verses in corpus_strategy(), query in query_strategy()) {
        let engine = QueryEngine::new(10);
        let index = SearchIndex::build(&verses);
        prop_assert_eq!(
            engine.search(&query, &verses, &index),
            engine.search(&query, &verses, &index)
        );

        // A second build, from a reordered corpus, ranks identically.
        let mut reversed = verses.clone();
        reversed.reverse();
        let rebuilt = SearchIndex::build(&reversed);
        prop_assert_eq!(
            engine.search(&query, &verses, &index),
            engine.search(&query, &verses, &rebuilt)
        );
    }

    #[test]
    fn more_coverage_never_ranks_lower(verses in corpus_strategy(), query in query_strategy()) {
        let index = SearchIndex::build(&verses);
        let results = QueryEngine::new(usize::MAX).search(&query, &verses, &index);
        for (i, earlier) in results.iter().enumerate() {
            for later in &results[i + 1..] {
                prop_assert!(earlier.matched_terms.len() >= later.matched_terms.len());
            }
        }
    }
}
