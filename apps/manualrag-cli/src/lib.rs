//! Adapters that let the CLI drive the citation core from files on disk:
//! a retriever over a saved fragment list and a model that replays a saved
//! response.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use manualrag_core::traits::{LanguageModel, RetrievalKind, Retriever};
use manualrag_core::types::{partition, RetrievedFragment};

pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads a JSON array of retrieved fragments.
pub fn load_fragments(path: &Path) -> Result<Vec<RetrievedFragment>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing fragments from {}", path.display()))
}

/// Groups fragments by their `filename` metadata, keeping order within a group.
pub fn group_by_filename(fragments: &[RetrievedFragment]) -> BTreeMap<String, Vec<RetrievedFragment>> {
    let mut groups: BTreeMap<String, Vec<RetrievedFragment>> = BTreeMap::new();
    for fragment in fragments {
        groups.entry(fragment.metadata.filename().to_string()).or_default().push(fragment.clone());
    }
    groups
}

/// Serves a saved retrieval result, split into text and non-text by type.
pub struct FileRetriever {
    text: Vec<RetrievedFragment>,
    non_text: Vec<RetrievedFragment>,
}

impl FileRetriever {
    pub fn new(fragments: Vec<RetrievedFragment>) -> Self {
        let (text, non_text) = partition(fragments);
        Self { text, non_text }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(load_fragments(path)?))
    }
}

impl Retriever for FileRetriever {
    fn retrieve(&self, _question: &str, kind: RetrievalKind, k: usize) -> Result<Vec<RetrievedFragment>> {
        let source = match kind {
            RetrievalKind::Text => &self.text,
            RetrievalKind::NonText => &self.non_text,
        };
        Ok(source.iter().take(k).cloned().collect())
    }
}

/// A language model stand-in that answers every prompt with a recorded response.
#[derive(Default)]
pub struct ReplayModel {
    response: String,
}

impl ReplayModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let response = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Self::new(response))
    }
}

impl LanguageModel for ReplayModel {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }
}
