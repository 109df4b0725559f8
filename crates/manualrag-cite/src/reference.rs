//! Numbered reference block for the prompt, and the history block recorded
//! per query.
use std::fmt::Write;

use manualrag_core::config::CitationSettings;
use manualrag_core::types::{FragmentKind, RetrievedFragment};

use crate::char_prefix;

pub const HISTORY_HEADER: &str = "=== REFERENCED CONTEXT FROM RAG RETRIEVAL ===";

#[derive(Debug, Clone)]
pub struct ReferenceFormatter {
    preview_chars: usize,
}

impl Default for ReferenceFormatter {
    fn default() -> Self {
        Self { preview_chars: 500 }
    }
}

impl ReferenceFormatter {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars: preview_chars.max(1) }
    }

    pub fn from_settings(settings: &CitationSettings) -> Self {
        Self::new(settings.reference_preview_chars)
    }

    /// One block per fragment, text first, separated by blank lines. Text
    /// blocks carry a bounded content preview; non-text blocks carry only
    /// type and location. Both lists empty gives an empty string.
    pub fn build(&self, text_fragments: &[RetrievedFragment], non_text_fragments: &[RetrievedFragment]) -> String {
        let text_blocks = text_fragments.iter().map(|f| {
            let content = f.content.trim();
            let preview = char_prefix(content, self.preview_chars);
            let ellipsis = if preview.len() < content.len() { "..." } else { "" };
            format!("{} {}\n{}{}", citation_label(f), location(f), preview, ellipsis)
        });
        let non_text_blocks = non_text_fragments
            .iter()
            .map(|f| format!("{} {}\nType: {}", citation_label(f), location(f), non_text_kind(f)));
        text_blocks.chain(non_text_blocks).collect::<Vec<_>>().join("\n\n")
    }
}

pub fn build_reference_block(text_fragments: &[RetrievedFragment], non_text_fragments: &[RetrievedFragment]) -> String {
    ReferenceFormatter::default().build(text_fragments, non_text_fragments)
}

/// The block appended to a session's conversation history after a query:
/// full text content of every text source, type and location of the rest.
pub fn format_history_block(text_fragments: &[RetrievedFragment], non_text_fragments: &[RetrievedFragment]) -> String {
    if text_fragments.is_empty() && non_text_fragments.is_empty() {
        return String::new();
    }
    let mut block = String::from(HISTORY_HEADER);
    for f in text_fragments {
        let _ = write!(block, "\n\n[Source {}] {}\n{}", number(f), short_location(f), f.content.trim());
    }
    for f in non_text_fragments {
        let kind = non_text_kind(f);
        let _ = write!(
            block,
            "\n\n[Source {}] {}\n{} on page {}",
            number(f),
            short_location(f),
            kind,
            f.metadata.page_label()
        );
    }
    block
}

pub(crate) fn non_text_kind(fragment: &RetrievedFragment) -> FragmentKind {
    fragment.metadata.declared_kind().unwrap_or(FragmentKind::Image)
}

fn number(fragment: &RetrievedFragment) -> String {
    fragment.citation_num.map_or_else(|| "?".to_string(), |n| n.to_string())
}

fn citation_label(fragment: &RetrievedFragment) -> String {
    format!("[{}]", number(fragment))
}

fn location(fragment: &RetrievedFragment) -> String {
    format!("Source: {}", short_location(fragment))
}

fn short_location(fragment: &RetrievedFragment) -> String {
    format!("{}, page {}", fragment.metadata.filename(), fragment.metadata.page_label())
}
