//! JSONL (JSON Lines) storage.
//!
//! One JSON object per line. Used for line-oriented match logs and for the
//! derived player, deck and color outputs.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};

/// Derived output files written after a statistics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKind {
    Players,
    Decks,
    Colors,
}

impl DerivedKind {
    pub const ALL: [DerivedKind; 3] = [DerivedKind::Players, DerivedKind::Decks, DerivedKind::Colors];

    pub fn filename(&self) -> &'static str {
        match self {
            DerivedKind::Players => "players.jsonl",
            DerivedKind::Decks => "decks.jsonl",
            DerivedKind::Colors => "colors.jsonl",
        }
    }
}

/// Path of a derived output file.
pub fn derived_path(config: &StorageConfig, kind: DerivedKind) -> PathBuf {
    config.derived_dir().join(kind.filename())
}

fn write_lines<T: Serialize, W: Write>(writer: &mut W, entities: &[T]) -> Result<usize, StorageError> {
    for entity in entities {
        serde_json::to_writer(&mut *writer, entity)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(entities.len())
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Writer for one of the derived output files.
    pub fn for_derived(config: &StorageConfig, kind: DerivedKind) -> Self {
        Self::new(derived_path(config, kind))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        let count = write_lines(&mut writer, entities)?;
        info!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn for_derived(config: &StorageConfig, kind: DerivedKind) -> Self {
        Self::new(derived_path(config, kind))
    }

    /// Read every parsable line. A missing file reads as empty; bad lines are
    /// logged and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping line {} in {:?}: {}", index + 1, self.path, e),
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Number of non-blank lines in the file.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut count = 0;
        for line in reader.lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EliminationType, Match, Participant};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample(date: &str) -> Match {
        Match::new(
            date,
            vec![
                Participant::new("Ann", "Krenko").winner(),
                Participant::new("Bo", "Atraxa").eliminated(8, EliminationType::CombatDamage, "Ann"),
            ],
        )
    }

    #[test]
    fn test_write_all_then_read_all() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("matches.jsonl");
        let matches = vec![sample("2024-01-01"), sample("2024-01-08")];

        let written = JsonlWriter::new(&path).write_all(&matches).unwrap();
        let read: Vec<Match> = JsonlReader::new(&path).read_all().unwrap();

        assert_eq!(written, 2);
        assert_eq!(read, matches);
    }

    #[test]
    fn test_write_all_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("log.jsonl");

        JsonlWriter::new(&path)
            .write_all(&[sample("2024-01-01"), sample("2024-03-01")])
            .unwrap();

        let reader: JsonlReader<Match> = JsonlReader::new(&path);
        assert_eq!(reader.count().unwrap(), 2);
        assert_eq!(reader.read_all().unwrap()[1].date.as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn test_write_all_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("replace.jsonl");
        let writer = JsonlWriter::new(&path);

        writer.write_all(&[sample("2024-01-01"), sample("2024-01-02")]).unwrap();
        writer.write_all(&[sample("2025-01-01")]).unwrap();

        let read: Vec<Match> = JsonlReader::new(&path).read_all().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].year(), Some(2025));
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<Match> = JsonlReader::new(temp_dir.path().join("absent.jsonl"));

        assert!(reader.read_all().unwrap().is_empty());
        assert_eq!(reader.count().unwrap(), 0);
    }

    #[test]
    fn test_bad_and_blank_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mixed.jsonl");
        let good = serde_json::to_string(&sample("2024-05-05")).unwrap();
        fs::write(&path, format!("{good}\n\nnot json\n{good}\n")).unwrap();

        let reader: JsonlReader<Match> = JsonlReader::new(&path);

        assert_eq!(reader.read_all().unwrap().len(), 2);
        assert_eq!(reader.count().unwrap(), 3);
    }

    #[test]
    fn test_derived_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));
        assert_eq!(
            derived_path(&config, DerivedKind::Decks),
            PathBuf::from("/data/derived/decks.jsonl")
        );
        let names: Vec<_> = DerivedKind::ALL.iter().map(|k| k.filename()).collect();
        assert_eq!(names, vec!["players.jsonl", "decks.jsonl", "colors.jsonl"]);

        let reader: JsonlReader<Match> = JsonlReader::for_derived(&config, DerivedKind::Colors);
        assert_eq!(reader.count().unwrap(), 0);
    }
}
