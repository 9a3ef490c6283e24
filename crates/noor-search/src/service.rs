//! Search service: memoized index, fresh corpus reads, citation recording.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use noor_core::{Error, Result, SearchSettings};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::corpus::CorpusStore;
use crate::engine::QueryEngine;
use crate::index::SearchIndex;
use crate::recorder::CitationRecorder;
use crate::types::*;

/// Answers questions from the verse corpus and records what was cited.
///
/// The index is built on the first search and reused afterwards. The corpus
/// itself is re-read on every search, so verses added later still show up in
/// results, ranked with the term statistics of the last build. Call
/// [`SearchService::rebuild`] after corpus writes to refresh those statistics.
pub struct SearchService<S> {
    store: Arc<S>,
    engine: QueryEngine,
    settings: SearchSettings,
    index: RwLock<IndexSlot>,
    /// Last generation handed out; taken before each corpus read.
    generations: AtomicU64,
}

/// The memoized index and the generation of the corpus read it came from.
///
/// A build only lands if its generation is newer than the slot's, so a slow
/// build over an older snapshot never replaces a newer index or undoes an
/// invalidation.
#[derive(Default)]
struct IndexSlot {
    generation: u64,
    index: Option<Arc<SearchIndex>>,
}

impl<S: CorpusStore> SearchService<S> {
    pub fn new(store: Arc<S>, settings: SearchSettings) -> Self {
        Self {
            store,
            engine: QueryEngine::new(settings.top_k),
            settings,
            index: RwLock::new(IndexSlot::default()),
            generations: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Search the corpus and record the question.
    pub fn search(&self, query: &str) -> Result<SearchAnswer> {
        self.search_cancellable(query, &AtomicBool::new(false))
    }

    /// Like [`search`](Self::search), but gives up with [`Error::Cancelled`] if
    /// `cancel` is set before citation recording starts. Once recording has
    /// started it completes or rolls back as a whole.
    pub fn search_cancellable(&self, query: &str, cancel: &AtomicBool) -> Result<SearchAnswer> {
        let index = self.ensure_index()?;

        let verses = self.store.list_verses().map_err(|e| {
            error!("Failed to read verse corpus: {}", e);
            e
        })?;

        let matches = self.engine.search(query, &verses, &index);

        if matches.is_empty() {
            if !self.settings.record_unanswered || query.trim().is_empty() {
                return Ok(SearchAnswer::no_results(None));
            }
            Self::check_cancelled(cancel)?;
            let question_id =
                CitationRecorder::record(&*self.store, query, Some(NO_RESULTS_ANSWER), &[])?;
            return Ok(SearchAnswer::no_results(Some(question_id)));
        }

        Self::check_cancelled(cancel)?;

        let top = &matches[0].verse;
        let stored_answer = top
            .text_translation
            .as_deref()
            .unwrap_or(&top.text_original);
        let question_id =
            CitationRecorder::record(&*self.store, query, Some(stored_answer), &matches)?;

        let answer = match &top.text_translation {
            Some(translation) => format!("{}\n\nTranslation: {}", top.text_original, translation),
            None => top.text_original.clone(),
        };

        Ok(SearchAnswer {
            answer,
            references: matches.iter().map(Reference::from).collect(),
            question_id: Some(question_id),
        })
    }

    /// Build a fresh index from the current corpus and swap it in.
    ///
    /// Searches already running keep the index they started with. Returns the
    /// status of the index installed once this call finishes, which is a newer
    /// build's if one overtook this one.
    pub fn rebuild(&self) -> Result<IndexStatus> {
        let generation = self.next_generation();
        let index = self.build_index()?;

        let mut slot = self.index.write();
        if generation > slot.generation {
            slot.generation = generation;
            slot.index = Some(index);
        } else {
            debug!(
                "Discarding index build {}; generation {} is newer",
                generation, slot.generation
            );
        }
        Ok(slot
            .index
            .as_deref()
            .map(Self::status_of)
            .unwrap_or_default())
    }

    /// Drop the memoized index; the next search rebuilds it.
    pub fn invalidate(&self) {
        let generation = self.next_generation();
        let mut slot = self.index.write();
        if generation > slot.generation {
            slot.generation = generation;
            if slot.index.take().is_some() {
                info!("Search index invalidated");
            }
        }
    }

    pub fn index_status(&self) -> IndexStatus {
        match self.index.read().index.as_deref() {
            Some(index) => Self::status_of(index),
            None => IndexStatus::default(),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ensure_index(&self) -> Result<Arc<SearchIndex>> {
        let cached = self.index.read().index.clone();
        if let Some(index) = cached {
            return Ok(index);
        }

        let generation = self.next_generation();
        let built = self.build_index()?;

        let mut slot = self.index.write();
        // A concurrent caller may have finished first; keep whichever landed.
        if let Some(existing) = &slot.index {
            return Ok(Arc::clone(existing));
        }
        if generation > slot.generation {
            slot.generation = generation;
            slot.index = Some(Arc::clone(&built));
        }
        Ok(built)
    }

    fn build_index(&self) -> Result<Arc<SearchIndex>> {
        let started = Instant::now();
        let verses = self.store.list_verses().map_err(|e| {
            error!("Search index build failed: {}", e);
            e
        })?;
        let index = SearchIndex::build(&verses);
        info!(
            "Search index built: {} verses, {} terms in {:?}",
            index.doc_count(),
            index.vocabulary_size(),
            started.elapsed()
        );
        Ok(Arc::new(index))
    }

    fn status_of(index: &SearchIndex) -> IndexStatus {
        IndexStatus {
            built: true,
            indexed_verses: index.doc_count(),
            vocabulary_size: index.vocabulary_size(),
        }
    }

    fn check_cancelled(cancel: &AtomicBool) -> Result<()> {
        if cancel.load(Ordering::SeqCst) {
            warn!("Search cancelled before recording citations");
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
