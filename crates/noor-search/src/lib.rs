//! Verse search: index construction, ranking, and citation recording.
//!
//! [`SearchService`] ties the pieces together: it memoizes a [`SearchIndex`]
//! built from the corpus, ranks verses with the [`QueryEngine`], and records
//! each answered question through the [`CitationRecorder`].

pub mod corpus;
pub mod engine;
pub mod index;
pub mod normalize;
pub mod recorder;
pub mod service;
pub mod types;

pub use corpus::CorpusStore;
pub use engine::QueryEngine;
pub use index::SearchIndex;
pub use recorder::CitationRecorder;
pub use service::SearchService;
pub use types::*;
