//! State journal implementations
//!
//! The engine treats persistence as a key-value document store behind the
//! [`StateJournal`] trait. Two implementations ship here:
//!
//! - [`MemoryJournal`]: process-local, for tests and embeddings that manage
//!   durability themselves
//! - [`JsonFileJournal`]: a single JSON document on disk, rewritten
//!   atomically (temp file + rename) on every mutation; moderation traffic
//!   is low-frequency enough that whole-file rewrites hold up fine
//!
//! Journal methods are called *after* the in-memory store mutation and never
//! under its lock, so a slow disk stalls only the operation that wrote.

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use warden_core_restrict::{JournalDoc, RestrictError, Result, StateJournal};

/// In-memory journal
#[derive(Debug, Default)]
pub struct MemoryJournal {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateJournal for MemoryJournal {
    fn load_all(&self) -> Result<Vec<JournalDoc>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .map(|(key, body)| JournalDoc::new(key.clone(), body.clone()))
            .collect())
    }

    fn save(&self, doc: &JournalDoc) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.insert(doc.key.clone(), doc.body.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.remove(key);
        Ok(())
    }
}

/// File-backed journal storing all documents in one JSON object
pub struct JsonFileJournal {
    path: PathBuf,
    docs: Mutex<HashMap<String, Value>>,
}

impl JsonFileJournal {
    /// Open a journal at `path`, reading existing documents if the file
    /// exists. A missing file is an empty journal, not an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let docs = if path.exists() {
            let text = fs::read_to_string(&path)
                .map_err(|e| RestrictError::journal(format!("read {}: {}", path.display(), e)))?;
            serde_json::from_str(&text)
                .map_err(|e| RestrictError::journal(format!("parse {}: {}", path.display(), e)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            docs: Mutex::new(docs),
        })
    }

    /// Write the full document set to disk, atomically
    fn flush(&self, docs: &HashMap<String, Value>) -> Result<()> {
        let text = serde_json::to_string_pretty(docs)
            .map_err(|e| RestrictError::journal(format!("serialize journal: {}", e)))?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, text).map_err(|e| {
            RestrictError::journal(format!("write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            RestrictError::journal(format!("rename into {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}

impl StateJournal for JsonFileJournal {
    fn load_all(&self) -> Result<Vec<JournalDoc>> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .map(|(key, body)| JournalDoc::new(key.clone(), body.clone()))
            .collect())
    }

    fn save(&self, doc: &JournalDoc) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        docs.insert(doc.key.clone(), doc.body.clone());
        self.flush(&docs)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        if docs.remove(key).is_some() {
            self.flush(&docs)?;
        }
        Ok(())
    }
}
