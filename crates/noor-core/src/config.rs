//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Paths to all Noor data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// Verse seed files queued for import (`data/imports/`).
    pub imports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            imports: root.join("imports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db)?;
        std::fs::create_dir_all(&self.imports)?;
        Ok(())
    }
}

/// Tuning for the search core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum number of matches returned (and cited) per query.
    pub top_k: usize,
    /// Store a question even when the search found nothing.
    pub record_unanswered: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            record_unanswered: false,
        }
    }
}

/// Top-level Noor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoorConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub search: SearchSettings,
    /// How long a store operation waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl NoorConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = env_parse("PORT").unwrap_or(3000);
        let defaults = SearchSettings::default();

        let search = SearchSettings {
            top_k: env_parse::<usize>("NOOR_TOP_K")
                .filter(|k| *k > 0)
                .unwrap_or(defaults.top_k),
            record_unanswered: std::env::var("NOOR_RECORD_UNANSWERED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.record_unanswered),
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            search,
            busy_timeout_ms: env_parse("NOOR_BUSY_TIMEOUT_MS").unwrap_or(5000),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

/// Parse common boolean spellings used in environment variables.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
