//! Local file input and output.
//!
//! Raw records may be stored as:
//! - a JSON array of match objects
//! - a FACEIT list envelope (`{"items": [...]}`, or `{"matches": [...]}`)
//! - JSON Lines, one match per line
//!
//! Normalized output is always written as JSONL.

mod jsonl;

pub use jsonl::*;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::raw::RawResult;

/// Envelope keys that hold a record list.
const ENVELOPE_KEYS: [&str; 2] = ["items", "matches"];

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

/// Load raw match records from a JSON, envelope or JSONL file.
///
/// Unreadable JSONL lines are skipped with a warning; a single JSON object
/// that is not an envelope is treated as one record.
pub fn load_records(path: &Path) -> Result<Vec<Value>, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records = match serde_json::from_str::<Value>(&contents) {
        Ok(value) => unwrap_envelope(value),
        Err(e) if contents.trim_start().starts_with('[') => return Err(e.into()),
        Err(_) => {
            debug!("{:?} is not a single JSON document, reading as JSONL", path);
            JsonlReader::<Value>::new(path.to_path_buf()).read_all()?
        }
    };

    debug!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Load a single JSON document, such as a match statistics payload.
pub fn load_document(path: &Path) -> Result<Value, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load a results listing. Entries of the wrong shape are skipped.
pub fn load_results(path: &Path) -> Result<Vec<RawResult>, StorageError> {
    Ok(typed(load_records(path)?, path))
}

fn unwrap_envelope(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            vec![Value::Object(map)]
        }
        other => vec![other],
    }
}

fn typed<T: DeserializeOwned>(values: Vec<Value>, path: &Path) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| match serde_json::from_value(v) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Skipping entry {} in {:?}: {}", i, path, e);
                None
            }
        })
        .collect()
}
