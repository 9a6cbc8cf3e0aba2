use crate::entry::EntryRow;
use crate::error::{ModelError, Result};
use crate::lang::LangPair;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted table of everything fetched so far for one language pair.
///
/// Collection runs append rows as terms complete and rewrite the file
/// periodically; on restart, [`Checkpoint::fetched_terms`] tells the run
/// which terms to skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: String,
    pub pair: LangPair,
    /// RFC 3339 timestamp of the last save.
    pub updated_at: String,
    pub rows: Vec<EntryRow>,
}

impl Checkpoint {
    pub fn new(pair: LangPair) -> Self {
        Self {
            version: "1.0".to_string(),
            pair,
            updated_at: chrono::Utc::now().to_rfc3339(),
            rows: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the checkpoint at `path` if there is one, else start an empty one.
    ///
    /// An existing checkpoint for a different language pair is an error
    /// rather than something to silently overwrite.
    pub fn load_or_new(path: &Path, pair: &LangPair) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No checkpoint yet, starting fresh");
            return Ok(Self::new(pair.clone()));
        }

        let checkpoint = Self::load(path)?;
        if &checkpoint.pair != pair {
            return Err(ModelError::LanguageMismatch {
                path: path.to_path_buf(),
                found: checkpoint.pair.to_string(),
                expected: pair.to_string(),
            });
        }
        tracing::info!(
            path = %path.display(),
            rows = checkpoint.rows.len(),
            terms = checkpoint.term_count(),
            "Loaded checkpoint"
        );
        Ok(checkpoint)
    }

    /// Write the checkpoint as JSON, replacing `path` atomically.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let json = self.snapshot(path)?;
        Self::write_snapshot(path, &json)
    }

    /// Stamp `updated_at` and serialize, ready for [`Checkpoint::write_snapshot`].
    ///
    /// Async callers run the write on a blocking thread.
    pub fn snapshot(&mut self, path: &Path) -> Result<Vec<u8>> {
        self.updated_at = chrono::Utc::now().to_rfc3339();
        serde_json::to_vec(self).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write serialized checkpoint bytes through a temp file and a rename.
    pub fn write_snapshot(path: &Path, json: &[u8]) -> Result<()> {
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|source| ModelError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), bytes = json.len(), "Saved checkpoint");
        Ok(())
    }

    pub fn append(&mut self, rows: Vec<EntryRow>) {
        self.rows.extend(rows);
    }

    /// Distinct terms that already have at least one row.
    pub fn fetched_terms(&self) -> HashSet<&str> {
        self.rows.iter().map(|r| r.term.as_str()).collect()
    }

    pub fn term_count(&self) -> usize {
        self.fetched_terms().len()
    }

    /// Distinct terms in the order they were first recorded.
    pub fn terms_in_order(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| r.term.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    pub fn rows_for<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a EntryRow> + 'a {
        self.rows.iter().filter(move |r| r.term == term)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
