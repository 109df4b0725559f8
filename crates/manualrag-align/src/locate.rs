//! Span locator: finds where a retrieved fragment sits in a reference document.
//!
//! Strategies are tried in order of decreasing confidence and the first hit
//! wins. Every search is a forward scan from the start of the document, so
//! the earliest occurrence always wins ties.
//!
//! Offsets are character offsets. Searching happens on bytes and the hits
//! are converted before a [`Span`] is built.
use manualrag_core::config::LocateSettings;
use manualrag_core::types::{char_offset, RetrievedFragment, Span};

#[derive(Debug, Clone)]
pub struct SpanLocator {
    prefix_chars: usize,
}

impl Default for SpanLocator {
    fn default() -> Self {
        Self { prefix_chars: 50 }
    }
}

impl SpanLocator {
    pub fn new(prefix_chars: usize) -> Self {
        Self { prefix_chars: prefix_chars.max(1) }
    }

    pub fn from_settings(settings: &LocateSettings) -> Self {
        Self::new(settings.prefix_chars)
    }

    /// Locate a fragment, honoring its declared type: non-text fragments are
    /// matched without a position and never searched for.
    pub fn locate_fragment(&self, fragment: &RetrievedFragment, document_text: &str) -> Span {
        if fragment.is_text() {
            self.locate(&fragment.content, document_text)
        } else {
            Span::unpositioned()
        }
    }

    pub fn locate(&self, fragment_content: &str, document_text: &str) -> Span {
        let content = fragment_content.trim();
        if content.is_empty() || document_text.is_empty() {
            return Span::unmapped();
        }

        if let Some(pos) = document_text.find(content) {
            let start = char_offset(document_text, pos);
            return Span::new(start, start + content.chars().count(), Span::EXACT);
        }
        if let Some(span) = bracketing_match(content, document_text) {
            return span;
        }
        if let Some(span) = self.prefix_match(content, document_text) {
            return span;
        }
        Span::unmapped()
    }

    fn prefix_match(&self, content: &str, document_text: &str) -> Option<Span> {
        let cut = content
            .char_indices()
            .nth(self.prefix_chars)
            .map_or(content.len(), |(i, _)| i);
        let prefix = content[..cut].trim();
        if prefix.is_empty() {
            return None;
        }
        let start = char_offset(document_text, document_text.find(prefix)?);
        // The tail is unverified; assume the fragment runs on for its own length.
        let estimated_end = (start + content.chars().count()).min(document_text.chars().count());
        Some(Span::new(start, estimated_end, Span::PREFIX))
    }
}

/// Locate with the default prefix length.
pub fn locate(fragment_content: &str, document_text: &str) -> Span {
    SpanLocator::default().locate(fragment_content, document_text)
}

fn bracketing_match(content: &str, document_text: &str) -> Option<Span> {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() < 2 {
        return None;
    }
    let first = lines[0].trim();
    let last = lines[lines.len() - 1].trim();
    if first.is_empty() || last.is_empty() {
        return None;
    }

    let first_pos = document_text.find(first)?;
    let search_from = first_pos + first.len();
    let last_pos = search_from + document_text[search_from..].find(last)?;
    Some(Span::new(
        char_offset(document_text, first_pos),
        char_offset(document_text, last_pos + last.len()),
        Span::BRACKETED,
    ))
}

/// Confidence tier of a mapping, as shown next to each chunk in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Unmatched,
    Prefix,
    Bracketed,
    Exact,
}

impl Confidence {
    pub fn from_score(score: f32) -> Self {
        if score >= Span::EXACT {
            Self::Exact
        } else if score >= Span::BRACKETED {
            Self::Bracketed
        } else if score >= Span::PREFIX {
            Self::Prefix
        } else {
            Self::Unmatched
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Bracketed => "bracketed",
            Self::Prefix => "prefix",
            Self::Unmatched => "unmatched",
        }
    }
}
