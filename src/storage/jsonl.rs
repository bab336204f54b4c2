//! JSONL (JSON Lines) reading and writing.
//!
//! Each line is a valid JSON object representing one entity.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append entities to the file, creating it if needed.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let count = write_lines(BufWriter::new(file), entities)?;
        info!("Appended {} entities to {:?}", count, self.path);
        Ok(count)
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let count = write_lines(BufWriter::new(file), entities)?;
        info!("Wrote {} entities to {:?}", count, self.path);
        Ok(count)
    }
}

fn write_lines<T: Serialize, W: Write>(
    mut writer: BufWriter<W>,
    entities: &[T],
) -> Result<usize, StorageError> {
    for entity in entities {
        let json = serde_json::to_string(entity)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;
    Ok(entities.len())
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Read all entities from the file; unparseable lines are skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entities = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Failed to parse line {} in {:?}: {}", i + 1, self.path, e),
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Match, MatchState, Participant, Side, Team};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn game(id: &str) -> Match {
        let side = |n: &str| Side::new(Participant::Team(Team::new(n.into(), n.to_uppercase())));
        Match::new(id.into(), side("a"), side("b"), MatchState::Scheduled).with_coordinates(0, 0)
    }

    #[test]
    fn test_write_and_read_matches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out/matches.jsonl");

        let matches = vec![game("m1"), game("m2")];
        let writer: JsonlWriter<Match> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&matches).unwrap(), 2);

        let reader: JsonlReader<Match> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), matches);
    }

    #[test]
    fn test_write_all_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overwrite.jsonl");
        let writer: JsonlWriter<Match> = JsonlWriter::new(path.clone());

        writer.write_all(&[game("old")]).unwrap();
        writer.write_all(&[game("n1"), game("n2")]).unwrap();

        let read = JsonlReader::<Match>::new(path).read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].id.as_str(), "n1");
    }

    #[test]
    fn test_append_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("append.jsonl");
        let writer: JsonlWriter<Match> = JsonlWriter::new(path.clone());

        assert_eq!(writer.append_batch(&[]).unwrap(), 0);
        writer.append_batch(&[game("m1")]).unwrap();
        writer.append_batch(&[game("m2")]).unwrap();

        assert_eq!(JsonlReader::<Match>::new(path).read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");
        std::fs::write(&path, "{\"a\":1}\nnot-valid-json\n\n{\"a\":2}\n").unwrap();

        let values = JsonlReader::<serde_json::Value>::new(path).read_all().unwrap();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<Match> = JsonlReader::new(temp_dir.path().join("none.jsonl"));
        assert!(reader.read_all().unwrap().is_empty());
    }
}
