//! SQLite-backed corpus store.
//!
//! Holds the verse corpus read by the search index and the audit trail of
//! questions and their reference links. Citation writes go through a single
//! transaction so a question is never visible without its links.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::schema::{CITATIONS_SQL, VERSES_SQL};
use crate::types::*;
use noor_core::{Error, Result};

/// Column list shared by every verse query, in `row_to_verse` order.
const VERSE_COLUMNS: &str = "id, chapter_number, verse_number, text_original, \
     text_translation, page_number, juz_number";

/// SQLite store for verses, questions, and reference links.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the SQLite store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/noor.db`.
    /// `busy_timeout` bounds how long any statement waits on a locked database.
    pub fn open(db_dir: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("noor.db");

        let conn = Self::create_connection(&db_path, busy_timeout)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "SqliteStore initialized: {} verses, {} questions, path={}",
            store.count_verses()?,
            store.count_questions()?,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path, busy_timeout: Duration) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}", VERSES_SQL, CITATIONS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Verses
    // ---------------------------------------------------------------

    /// All verses ordered by (chapter, verse).
    pub fn list_verses(&self) -> Result<Vec<Verse>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM verses ORDER BY chapter_number, verse_number",
            VERSE_COLUMNS
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_verse)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Get a verse by ID.
    pub fn get_verse(&self, id: &str) -> Result<Option<Verse>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {} FROM verses WHERE id = ?1", VERSE_COLUMNS);
        let row = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_verse)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Insert a single verse. Fails if the id or (chapter, verse) already exists.
    pub fn add_verse(&self, verse: &Verse) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO verses (id, chapter_number, verse_number, text_original, \
             text_translation, page_number, juz_number, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                verse.id,
                verse.chapter_number,
                verse.verse_number,
                verse.text_original,
                verse.text_translation,
                verse.page_number,
                verse.juz_number,
                now_millis(),
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Validate and insert a batch of seed verses in one transaction.
    ///
    /// Any invalid entry rejects the whole batch. Entries colliding with an
    /// existing id or (chapter, verse) are skipped and counted.
    pub fn import_verses(&self, seeds: Vec<VerseSeed>) -> Result<ImportReport> {
        for (i, seed) in seeds.iter().enumerate() {
            validate_seed(i, seed)?;
        }

        let now = now_millis();
        let mut report = ImportReport::default();

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO verses (id, chapter_number, verse_number, \
                     text_original, text_translation, page_number, juz_number, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;

            for seed in seeds {
                let verse = seed.into_verse();
                let changed = stmt
                    .execute(params![
                        verse.id,
                        verse.chapter_number,
                        verse.verse_number,
                        verse.text_original,
                        verse.text_translation,
                        verse.page_number,
                        verse.juz_number,
                        now,
                    ])
                    .map_err(|e| Error::Database(e.to_string()))?;
                if changed > 0 {
                    report.inserted += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;

        info!(
            "Imported verses: {} inserted, {} skipped",
            report.inserted, report.skipped
        );
        Ok(report)
    }

    /// Count verses in the corpus.
    pub fn count_verses(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM verses")
    }

    // ---------------------------------------------------------------
    // Questions & Reference Links
    // ---------------------------------------------------------------

    /// Insert a question and all its reference links as one transaction.
    ///
    /// Either every row commits or none do; the transaction rolls back when
    /// dropped on an error path.
    pub fn insert_citation(
        &self,
        question: &NewQuestion,
        links: &[NewReferenceLink],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;

        let written = Self::insert_question(&tx, question).and_then(|_| {
            links
                .iter()
                .try_for_each(|link| Self::insert_reference_link(&tx, link))
        });

        if let Err(e) = written {
            warn!(
                "Rolling back citation for question {}: {}",
                question.id, e
            );
            return Err(e);
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!(
            "Recorded question {} with {} reference links",
            question.id,
            links.len()
        );
        Ok(())
    }

    fn insert_question(conn: &Connection, question: &NewQuestion) -> Result<()> {
        conn.prepare_cached(
            "INSERT INTO questions (id, text, answer, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            question.id,
            question.text,
            question.answer,
            question.created_at
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    fn insert_reference_link(conn: &Connection, link: &NewReferenceLink) -> Result<()> {
        let metadata_json = serde_json::to_string(&link.metadata)?;
        conn.prepare_cached(
            "INSERT INTO reference_links (id, question_id, resource_id, metadata_json, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            link.id,
            link.question_id,
            link.resource_id,
            metadata_json,
            link.created_at
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Most recent questions first.
    pub fn list_questions(&self, limit: usize) -> Result<Vec<Question>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, text, answer, created_at FROM questions \
                 ORDER BY created_at DESC, id LIMIT ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_question)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Get a question with its reference links in citation order.
    pub fn get_question(&self, id: &str) -> Result<Option<QuestionWithLinks>> {
        let question = {
            let conn = self.conn.lock();
            let row = conn
                .prepare_cached("SELECT id, text, answer, created_at FROM questions WHERE id = ?1")
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params![id], Self::row_to_question)
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
            row
        };

        match question {
            Some(question) => {
                let references = self.get_reference_links(&question.id)?;
                Ok(Some(QuestionWithLinks {
                    question,
                    references,
                }))
            }
            None => Ok(None),
        }
    }

    /// Reference links owned by a question.
    pub fn get_reference_links(&self, question_id: &str) -> Result<Vec<ReferenceLink>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, question_id, resource_id, metadata_json, created_at \
                 FROM reference_links WHERE question_id = ?1 ORDER BY rowid",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![question_id], Self::row_to_link)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Delete a question and its reference links (cascade).
    pub fn delete_question(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM questions WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Count stored questions.
    pub fn count_questions(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM questions")
    }

    /// Count stored reference links.
    pub fn count_reference_links(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM reference_links")
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            total_verses: self.count_verses()?,
            total_questions: self.count_questions()?,
            total_reference_links: self.count_reference_links()?,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    fn count(&self, sql: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_verse(row: &rusqlite::Row<'_>) -> rusqlite::Result<Verse> {
        Ok(Verse {
            id: row.get(0)?,
            chapter_number: row.get(1)?,
            verse_number: row.get(2)?,
            text_original: row.get(3)?,
            text_translation: row.get(4)?,
            page_number: row.get(5)?,
            juz_number: row.get(6)?,
        })
    }

    fn row_to_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
        Ok(Question {
            id: row.get(0)?,
            text: row.get(1)?,
            answer: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceLink> {
        let metadata_json: String = row.get(3)?;
        let metadata = serde_json::from_str(&metadata_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(ReferenceLink {
            id: row.get(0)?,
            question_id: row.get(1)?,
            resource_id: row.get(2)?,
            metadata,
            created_at: row.get(4)?,
        })
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn validate_seed(index: usize, seed: &VerseSeed) -> Result<()> {
    if seed.chapter == 0 || seed.verse == 0 {
        return Err(Error::Validation(format!(
            "entry {}: chapter and verse must be positive",
            index
        )));
    }
    if seed.text.trim().is_empty() {
        return Err(Error::Validation(format!(
            "entry {} ({}:{}): text is required",
            index, seed.chapter, seed.verse
        )));
    }
    if seed.page == Some(0) {
        return Err(Error::Validation(format!(
            "entry {} ({}:{}): page must be positive",
            index, seed.chapter, seed.verse
        )));
    }
    if let Some(juz) = seed.juz {
        if !(1..=30).contains(&juz) {
            return Err(Error::Validation(format!(
                "entry {} ({}:{}): juz {} is outside 1..=30",
                index, seed.chapter, seed.verse, juz
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path(), Duration::from_secs(1)).unwrap();
        (store, dir)
    }

    fn seed(chapter: u32, verse: u32, text: &str, translation: Option<&str>) -> VerseSeed {
        VerseSeed {
            id: None,
            chapter,
            verse,
            text: text.to_string(),
            translation: translation.map(str::to_string),
            page: Some(1),
            juz: Some(1),
        }
    }

    fn new_question(id: &str) -> NewQuestion {
        NewQuestion {
            id: id.to_string(),
            text: "mercy".to_string(),
            answer: Some("The Most Merciful".to_string()),
            created_at: now_millis(),
        }
    }

    fn new_link(id: &str, question_id: &str, resource_id: &str) -> NewReferenceLink {
        NewReferenceLink {
            id: id.to_string(),
            question_id: question_id.to_string(),
            resource_id: resource_id.to_string(),
            metadata: CitationMetadata {
                chapter: 1,
                verse: 3,
                page: Some(1),
                juz: None,
            },
            created_at: now_millis(),
        }
    }

    #[test]
    fn test_import_and_list_verses_ordered() {
        let (store, _dir) = test_store();
        let report = store
            .import_verses(vec![
                seed(2, 1, "الم", Some("Alif, Lam, Meem")),
                seed(1, 2, "الْحَمْدُ لِلَّهِ", Some("All praise is due to Allah")),
                seed(1, 1, "بِسْمِ اللَّهِ", Some("In the name of Allah")),
            ])
            .unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.skipped, 0);

        let verses = store.list_verses().unwrap();
        let positions: Vec<_> = verses.iter().map(|v| v.position()).collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (2, 1)]);
        assert_eq!(verses[0].id, "1:1");
        assert_eq!(verses[0].page_number, Some(1));
    }

    #[test]
    fn test_import_skips_duplicates() {
        let (store, _dir) = test_store();
        store
            .import_verses(vec![seed(1, 1, "بِسْمِ اللَّهِ", None)])
            .unwrap();
        let report = store
            .import_verses(vec![
                seed(1, 1, "duplicate", None),
                seed(1, 2, "الْحَمْدُ لِلَّهِ", None),
            ])
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(store.count_verses().unwrap(), 2);
    }

    #[test]
    fn test_import_rejects_invalid_batch() {
        let (store, _dir) = test_store();
        let mut bad = seed(1, 2, "text", None);
        bad.juz = Some(31);
        let err = store
            .import_verses(vec![seed(1, 1, "ok", None), bad])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.count_verses().unwrap(), 0);

        let err = store.import_verses(vec![seed(0, 1, "text", None)]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = store.import_verses(vec![seed(1, 1, "   ", None)]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_blank_translation_stored_as_null() {
        let (store, _dir) = test_store();
        store
            .import_verses(vec![seed(1, 1, "بِسْمِ اللَّهِ", Some("  "))])
            .unwrap();
        let verse = store.get_verse("1:1").unwrap().unwrap();
        assert!(verse.text_translation.is_none());
    }

    #[test]
    fn test_insert_citation_and_read_back() {
        let (store, _dir) = test_store();
        store
            .import_verses(vec![seed(1, 3, "الرَّحْمَٰنِ الرَّحِيمِ", Some("The Most Merciful"))])
            .unwrap();

        store
            .insert_citation(&new_question("q1"), &[new_link("l1", "q1", "1:3")])
            .unwrap();

        let found = store.get_question("q1").unwrap().unwrap();
        assert_eq!(found.question.text, "mercy");
        assert_eq!(found.references.len(), 1);
        assert_eq!(found.references[0].resource_id, "1:3");
        assert_eq!(found.references[0].metadata.chapter, 1);
        assert_eq!(found.references[0].metadata.juz, None);
    }

    #[test]
    fn test_insert_citation_rolls_back_on_link_failure() {
        let (store, _dir) = test_store();
        store
            .import_verses(vec![seed(1, 3, "الرَّحْمَٰنِ الرَّحِيمِ", None)])
            .unwrap();

        // Second link cites a verse that does not exist: foreign key violation.
        let err = store
            .insert_citation(
                &new_question("q1"),
                &[new_link("l1", "q1", "1:3"), new_link("l2", "q1", "missing")],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        assert!(store.get_question("q1").unwrap().is_none());
        assert_eq!(store.count_questions().unwrap(), 0);
        assert_eq!(store.count_reference_links().unwrap(), 0);
    }

    #[test]
    fn test_insert_citation_rejects_duplicate_question_id() {
        let (store, _dir) = test_store();
        store.import_verses(vec![seed(1, 1, "text", None)]).unwrap();
        store
            .insert_citation(&new_question("q1"), &[new_link("l1", "q1", "1:1")])
            .unwrap();

        let err = store
            .insert_citation(&new_question("q1"), &[new_link("l2", "q1", "1:1")])
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(store.count_reference_links().unwrap(), 1);
    }

    #[test]
    fn test_delete_question_cascades() {
        let (store, _dir) = test_store();
        store.import_verses(vec![seed(1, 1, "text", None)]).unwrap();
        store
            .insert_citation(&new_question("q1"), &[new_link("l1", "q1", "1:1")])
            .unwrap();

        assert!(store.delete_question("q1").unwrap());
        assert!(!store.delete_question("q1").unwrap());
        assert_eq!(store.count_reference_links().unwrap(), 0);
    }

    #[test]
    fn test_list_questions_newest_first() {
        let (store, _dir) = test_store();
        let mut older = new_question("old");
        older.created_at = 1_000;
        let mut newer = new_question("new");
        newer.created_at = 2_000;
        store.insert_citation(&older, &[]).unwrap();
        store.insert_citation(&newer, &[]).unwrap();

        let questions = store.list_questions(10).unwrap();
        let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(store.list_questions(1).unwrap().len(), 1);
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        store.import_verses(vec![seed(1, 1, "text", None)]).unwrap();
        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total_verses, 1);
        assert_eq!(stats.total_questions, 0);
        assert!(stats.db_path.ends_with("noor.db"));
    }
}
