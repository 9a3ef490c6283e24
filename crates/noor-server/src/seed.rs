//! Seed tooling: import verse files and validate an existing database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use noor_core::{Error, Result};
use noor_store::{SqliteStore, VerseSeed};
use rusqlite::{Connection, OpenFlags};
use tracing::{error, info};

/// Tables the search core depends on.
const REQUIRED_TABLES: [&str; 3] = ["verses", "questions", "reference_links"];

/// Result of an import or validation run.
#[derive(Debug, Default)]
pub struct SeedReport {
    pub db_valid: bool,
    pub verses: i64,
    pub questions: i64,
    pub reference_links: i64,
    pub inserted: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Parse a seed file: a JSON array of `{ chapter, verse, text, translation?, page?, juz?, id? }`.
pub fn read_seed_file(path: &Path) -> Result<Vec<VerseSeed>> {
    let data = std::fs::read_to_string(path)?;
    let seeds: Vec<VerseSeed> = serde_json::from_str(&data)?;
    Ok(seeds)
}

/// Import a seed file into the database under `db_dir`.
pub fn import_file(db_dir: &Path, seed_path: &Path, busy_timeout: Duration) -> SeedReport {
    let mut report = SeedReport::default();

    let seeds = match read_seed_file(seed_path) {
        Ok(seeds) => seeds,
        Err(e) => {
            report
                .errors
                .push(format!("Failed to read {}: {}", seed_path.display(), e));
            return report;
        }
    };
    if seeds.is_empty() {
        report
            .warnings
            .push(format!("{} contains no verses", seed_path.display()));
    }

    let result = SqliteStore::open(db_dir, busy_timeout).and_then(|store| {
        let imported = store.import_verses(seeds)?;
        let stats = store.get_stats()?;
        Ok((imported, stats))
    });

    match result {
        Ok((imported, stats)) => {
            info!(
                "Imported {} verses from {} ({} skipped)",
                imported.inserted,
                seed_path.display(),
                imported.skipped
            );
            if imported.skipped > 0 {
                report.warnings.push(format!(
                    "{} verses already existed and were skipped",
                    imported.skipped
                ));
            }
            report.db_valid = true;
            report.inserted = imported.inserted;
            report.skipped = imported.skipped;
            report.verses = stats.total_verses;
            report.questions = stats.total_questions;
            report.reference_links = stats.total_reference_links;
        }
        Err(e) => {
            error!("Verse import failed: {}", e);
            report.errors.push(e.to_string());
        }
    }

    report
}

/// `.json` seed files directly inside `dir`, sorted by file name.
pub fn seed_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Import every seed file in `seed_dir` (by default `data/imports/`), in name order.
pub fn import_dir(db_dir: &Path, seed_dir: &Path, busy_timeout: Duration) -> SeedReport {
    let mut report = SeedReport::default();

    let files = match seed_files(seed_dir) {
        Ok(files) => files,
        Err(e) => {
            report
                .errors
                .push(format!("Failed to list {}: {}", seed_dir.display(), e));
            return report;
        }
    };

    if files.is_empty() {
        report
            .warnings
            .push(format!("No seed files found in {}", seed_dir.display()));
        match SqliteStore::open(db_dir, busy_timeout).and_then(|store| store.get_stats()) {
            Ok(stats) => {
                report.db_valid = true;
                report.verses = stats.total_verses;
                report.questions = stats.total_questions;
                report.reference_links = stats.total_reference_links;
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        return report;
    }

    info!("Importing {} seed files from {}", files.len(), seed_dir.display());
    for file in &files {
        let one = import_file(db_dir, file, busy_timeout);
        report.inserted += one.inserted;
        report.skipped += one.skipped;
        report.warnings.extend(one.warnings);
        report.errors.extend(one.errors);
        if one.db_valid {
            report.verses = one.verses;
            report.questions = one.questions;
            report.reference_links = one.reference_links;
        }
    }
    report.db_valid = report.errors.is_empty();
    report
}

/// Validate that `db_dir` holds a usable Noor database, without modifying it.
pub fn validate(db_dir: &Path) -> SeedReport {
    let mut report = SeedReport::default();

    let db_path = db_dir.join("noor.db");
    if !db_path.exists() {
        report
            .errors
            .push(format!("Database not found: {}", db_path.display()));
        return report;
    }

    let conn = match Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open database: {}", e));
            return report;
        }
    };

    for table in REQUIRED_TABLES {
        match table_exists(&conn, table) {
            Ok(true) => {}
            Ok(false) => report
                .errors
                .push(format!("Missing required table: {}", table)),
            Err(e) => report
                .errors
                .push(format!("Error checking table {}: {}", table, e)),
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    match count_rows(&conn) {
        Ok((verses, questions, links)) => {
            report.verses = verses;
            report.questions = questions;
            report.reference_links = links;
        }
        Err(e) => {
            report.errors.push(e.to_string());
            return report;
        }
    }

    if report.verses == 0 {
        report
            .warnings
            .push("Verse corpus is empty; every search will return no results".to_string());
    }

    report.db_valid = true;
    report
}

pub fn print_report(report: &SeedReport) {
    println!("=== Noor Database Report ===");
    println!();
    println!("Database valid:     {}", if report.db_valid { "YES" } else { "NO" });
    println!("Verses:             {}", report.verses);
    println!("Questions:          {}", report.questions);
    println!("Reference links:    {}", report.reference_links);
    if report.inserted > 0 || report.skipped > 0 {
        println!("Imported:           {}", report.inserted);
        println!("Skipped:            {}", report.skipped);
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.errors.is_empty() && report.db_valid {
        println!("Status: READY FOR USE");
    } else {
        println!("Status: FAILED");
    }
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn count_rows(conn: &Connection) -> Result<(i64, i64, i64)> {
    let count = |sql: &str| -> Result<i64> {
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    };
    Ok((
        count("SELECT COUNT(*) FROM verses")?,
        count("SELECT COUNT(*) FROM questions")?,
        count("SELECT COUNT(*) FROM reference_links")?,
    ))
}
