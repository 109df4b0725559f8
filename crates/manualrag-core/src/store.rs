//! Filesystem document store and in-memory conversation history.
//!
//! Both are reference implementations of the collaborator traits; the
//! citation core only ever talks to them through `traits`.
use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::Error;
use crate::traits::{DocumentStore, HistoryStore};
use crate::types::ReferenceDocument;

const DOCUMENT_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Serves reference documents from a directory of `.md`/`.txt` files.
///
/// A document is addressed by the `filename` metadata of its fragments; the
/// extension may be omitted (`manual` resolves to `manual.md`).
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, filename: &str) -> Vec<PathBuf> {
        let direct = self.root.join(filename);
        let mut out = vec![direct.clone()];
        out.extend(DOCUMENT_EXTENSIONS.iter().map(|ext| direct.with_extension(ext)));
        out
    }

    fn read_file_content(&self, file_path: &Path) -> crate::error::Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }
}

impl DocumentStore for FsDocumentStore {
    fn load(&self, filename: &str) -> Result<ReferenceDocument> {
        let path = self
            .candidates(filename)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| Error::DocumentNotFound(format!("{} (under {})", filename, self.root.display())))?;
        tracing::debug!(path = %path.display(), "loading reference document");
        let text = self.read_file_content(&path)?;
        Ok(ReferenceDocument::new(filename, text))
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(Error::DocumentNotFound(self.root.display().to_string()).into());
        }
        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let known = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext));
            if !known {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(path).with_extension("");
            names.push(relative.to_string_lossy().to_string());
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Conversation history held in memory, one message list per session.
#[derive(Default)]
pub struct InMemoryHistory {
    sessions: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, session_id: &str) -> Vec<String> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, session_id: &str, block: String) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| Error::History(format!("history for session '{session_id}' is poisoned")))?;
        sessions.entry(session_id.to_string()).or_default().push(block);
        Ok(())
    }
}
