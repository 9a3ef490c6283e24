//! Database schema SQL.

/// Verse corpus. `(chapter_number, verse_number)` identifies a verse.
pub const VERSES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS verses (
    id TEXT PRIMARY KEY,
    chapter_number INTEGER NOT NULL CHECK (chapter_number > 0),
    verse_number INTEGER NOT NULL CHECK (verse_number > 0),
    text_original TEXT NOT NULL,
    text_translation TEXT,
    page_number INTEGER,
    juz_number INTEGER,
    created_at INTEGER NOT NULL,
    UNIQUE (chapter_number, verse_number)
);

CREATE INDEX IF NOT EXISTS idx_verses_position ON verses(chapter_number, verse_number);
"#;

/// Questions and the verses cited to answer them.
pub const CITATIONS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    answer TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reference_links (
    id TEXT PRIMARY KEY,
    question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    resource_id TEXT NOT NULL REFERENCES verses(id),
    metadata_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reference_links_question ON reference_links(question_id);
CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created_at);
"#;
