//! Data types for verses, questions, and reference links.

use serde::{Deserialize, Serialize};

/// A verse row from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub id: String,
    pub chapter_number: u32,
    pub verse_number: u32,
    pub text_original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juz_number: Option<u32>,
}

impl Verse {
    /// Position key used for ordering and tie-breaks.
    pub fn position(&self) -> (u32, u32) {
        (self.chapter_number, self.verse_number)
    }
}

/// Verse coordinates captured when a citation is recorded.
///
/// Stored denormalized so a citation keeps pointing at what the user saw,
/// even if the corpus metadata is corrected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetadata {
    pub chapter: u32,
    pub verse: u32,
    pub page: Option<u32>,
    pub juz: Option<u32>,
}

impl From<&Verse> for CitationMetadata {
    fn from(verse: &Verse) -> Self {
        Self {
            chapter: verse.chapter_number,
            verse: verse.verse_number,
            page: verse.page_number,
            juz: verse.juz_number,
        }
    }
}

/// A question row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answer: Option<String>,
    pub created_at: i64,
}

/// A reference link row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub id: String,
    pub question_id: String,
    pub resource_id: String,
    pub metadata: CitationMetadata,
    pub created_at: i64,
}

/// A question together with everything it cited.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithLinks {
    #[serde(flatten)]
    pub question: Question,
    pub references: Vec<ReferenceLink>,
}

/// Question to insert. Ids are generated by the caller before the write begins.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub id: String,
    pub text: String,
    pub answer: Option<String>,
    pub created_at: i64,
}

/// Reference link to insert alongside its [`NewQuestion`].
#[derive(Debug, Clone)]
pub struct NewReferenceLink {
    pub id: String,
    pub question_id: String,
    pub resource_id: String,
    pub metadata: CitationMetadata,
    pub created_at: i64,
}

/// One entry of a verse seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct VerseSeed {
    #[serde(default)]
    pub id: Option<String>,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub juz: Option<u32>,
}

impl VerseSeed {
    /// Convert to a verse row. Seeds without an id get `"{chapter}:{verse}"`.
    pub fn into_verse(self) -> Verse {
        Verse {
            id: self
                .id
                .unwrap_or_else(|| format!("{}:{}", self.chapter, self.verse)),
            chapter_number: self.chapter,
            verse_number: self.verse,
            text_original: self.text,
            text_translation: self.translation.filter(|t| !t.trim().is_empty()),
            page_number: self.page,
            juz_number: self.juz,
        }
    }
}

/// Outcome of a verse import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub inserted: usize,
    /// Entries whose id or (chapter, verse) already existed.
    pub skipped: usize,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_verses: i64,
    pub total_questions: i64,
    pub total_reference_links: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}
