//! Local match dataset and derived-output storage.
//!
//! Layout under the data directory:
//! - `matches.json`: the exported match list (a JSON array)
//! - `derived/`: JSONL outputs of a statistics run

pub mod jsonl;

pub use jsonl::{derived_path, DerivedKind, JsonlReader, JsonlWriter};

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::Match;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Default location of the match dataset.
    pub fn matches_path(&self) -> PathBuf {
        self.data_dir.join("matches.json")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

/// Load a match dataset.
///
/// `.jsonl` files hold one match per line; anything else is read as a JSON
/// array of matches. Entries that are not match objects are logged and skipped.
pub fn read_matches(path: &Path) -> Result<Vec<Match>, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }

    let matches = if is_jsonl(path) {
        JsonlReader::new(path).read_all()?
    } else {
        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&contents)?;
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("Skipping entry {} in {:?}: {}", index, path, e);
                    None
                }
            })
            .collect()
    };

    info!("Loaded {} matches from {:?}", matches.len(), path);
    Ok(matches)
}

/// Replace one derived output file with `records`.
pub fn write_derived<T: Serialize>(
    config: &StorageConfig,
    kind: DerivedKind,
    records: &[T],
) -> Result<usize, StorageError> {
    JsonlWriter::for_derived(config, kind).write_all(records)
}

/// Rows currently on disk in each derived output file; missing files count 0.
pub fn derived_row_counts(config: &StorageConfig) -> Result<Vec<(DerivedKind, usize)>, StorageError> {
    DerivedKind::ALL
        .iter()
        .map(|kind| {
            let reader: JsonlReader<serde_json::Value> = JsonlReader::for_derived(config, *kind);
            Ok((*kind, reader.count()?))
        })
        .collect()
}
