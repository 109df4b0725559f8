//! Narrow interfaces to the external collaborators of the citation core.

use crate::types::{ReferenceDocument, RetrievedFragment};

/// Which retrieval collection a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalKind {
    Text,
    NonText,
}

pub trait Retriever: Send + Sync {
    fn retrieve(&self, question: &str, kind: RetrievalKind, k: usize) -> anyhow::Result<Vec<RetrievedFragment>>;
}

/// Opaque text-in/text-out model. Streaming, if any, is collapsed by the implementor.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub trait DocumentStore: Send + Sync {
    fn load(&self, filename: &str) -> anyhow::Result<ReferenceDocument>;
    fn list(&self) -> anyhow::Result<Vec<String>>;
}

/// Append-only conversation history keyed by session id.
pub trait HistoryStore: Send + Sync {
    fn append(&self, session_id: &str, block: String) -> anyhow::Result<()>;
}
