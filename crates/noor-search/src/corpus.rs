//! Read/write contract the search core needs from its corpus store.

use noor_core::Result;
use noor_store::{NewQuestion, NewReferenceLink, SqliteStore, Verse};

/// Storage the search core reads verses from and records citations into.
pub trait CorpusStore: Send + Sync {
    /// Every committed verse, ordered by (chapter, verse).
    fn list_verses(&self) -> Result<Vec<Verse>>;

    /// Persist a question and its reference links atomically.
    fn insert_citation(&self, question: &NewQuestion, links: &[NewReferenceLink]) -> Result<()>;
}

impl CorpusStore for SqliteStore {
    fn list_verses(&self) -> Result<Vec<Verse>> {
        SqliteStore::list_verses(self)
    }

    fn insert_citation(&self, question: &NewQuestion, links: &[NewReferenceLink]) -> Result<()> {
        SqliteStore::insert_citation(self, question, links)
    }
}
