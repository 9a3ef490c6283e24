//! Citation recorder: persists a question and the verses it was answered from.

use noor_core::{Error, Result};
use noor_store::{CitationMetadata, NewQuestion, NewReferenceLink};
use tracing::{debug, error};
use uuid::Uuid;

use crate::corpus::CorpusStore;
use crate::types::Match;

/// Writes one question plus one reference link per match.
pub struct CitationRecorder;

impl CitationRecorder {
    /// Record `query` and its `matches`, returning the new question id.
    ///
    /// All ids and timestamps are generated before the store transaction
    /// starts. The store writes the question and every link together or not
    /// at all; any failure comes back as [`Error::Citation`].
    pub fn record<S: CorpusStore + ?Sized>(
        store: &S,
        query: &str,
        answer: Option<&str>,
        matches: &[Match],
    ) -> Result<String> {
        let (question, links) = Self::prepare(query, answer, matches);

        store.insert_citation(&question, &links).map_err(|e| {
            error!("Failed to record question {}: {}", question.id, e);
            Error::Citation(e.to_string())
        })?;

        debug!(
            "Question {} recorded with {} citations",
            question.id,
            links.len()
        );
        Ok(question.id)
    }

    /// Build the rows for one citation, snapshotting each verse's metadata.
    pub fn prepare(
        query: &str,
        answer: Option<&str>,
        matches: &[Match],
    ) -> (NewQuestion, Vec<NewReferenceLink>) {
        let now = chrono::Utc::now().timestamp_millis();
        let question = NewQuestion {
            id: Uuid::new_v4().to_string(),
            text: query.to_string(),
            answer: answer.map(str::to_string),
            created_at: now,
        };

        let links = matches
            .iter()
            .map(|m| NewReferenceLink {
                id: Uuid::new_v4().to_string(),
                question_id: question.id.clone(),
                resource_id: m.verse.id.clone(),
                metadata: CitationMetadata::from(&m.verse),
                created_at: now,
            })
            .collect();

        (question, links)
    }
}
