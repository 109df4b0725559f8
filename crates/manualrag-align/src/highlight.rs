//! Renders chunk mappings as an ordered list of plain/chunk segments.
//!
//! Overlapping spans are not merged. The walk keeps a monotonic `last_end`
//! and a later-starting chunk is clipped to begin at it, so a chunk fully
//! inside its predecessor renders as an empty segment. Segment offsets are
//! character offsets, like the spans they come from.
use serde::Serialize;
use std::ops::Range;

use manualrag_core::types::ChunkMapping;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment<'a> {
    Text {
        start: usize,
        end: usize,
        content: &'a str,
    },
    Chunk {
        start: usize,
        end: usize,
        content: &'a str,
        chunk_index: usize,
        fragment_id: &'a str,
        chunk_type: String,
        page_idx: i64,
        match_score: f32,
    },
}

impl<'a> Segment<'a> {
    pub fn content(&self) -> &'a str {
        match self {
            Self::Text { content, .. } | Self::Chunk { content, .. } => *content,
        }
    }

    pub fn range(&self) -> Range<usize> {
        match self {
            Self::Text { start, end, .. } | Self::Chunk { start, end, .. } => *start..*end,
        }
    }

    pub fn is_chunk(&self) -> bool {
        matches!(self, Self::Chunk { .. })
    }
}

/// Plain text before and between chunks plus the chunks themselves, sorted
/// by span start. Text after the last chunk is not emitted; see [`cover`].
pub fn highlight<'a>(document_text: &'a str, mappings: &'a [ChunkMapping]) -> Vec<Segment<'a>> {
    walk(&CharText::new(document_text), mappings).0
}

/// Like [`highlight`] but followed by the trailing plain text, so the
/// segments cover the whole document.
pub fn cover<'a>(document_text: &'a str, mappings: &'a [ChunkMapping]) -> Vec<Segment<'a>> {
    let text = CharText::new(document_text);
    let (mut segments, last_end) = walk(&text, mappings);
    if last_end < text.len() {
        segments.push(text.segment(last_end..text.len()));
    }
    segments
}

/// Document text addressed by character offset.
struct CharText<'a> {
    text: &'a str,
    bounds: Vec<usize>,
}

impl<'a> CharText<'a> {
    fn new(text: &'a str) -> Self {
        let bounds = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        Self { text, bounds }
    }

    fn len(&self) -> usize {
        self.bounds.len() - 1
    }

    fn slice(&self, range: Range<usize>) -> &'a str {
        match (self.bounds.get(range.start), self.bounds.get(range.end)) {
            (Some(&start), Some(&end)) => self.text.get(start..end).unwrap_or_default(),
            _ => "",
        }
    }

    fn segment(&self, range: Range<usize>) -> Segment<'a> {
        Segment::Text { start: range.start, end: range.end, content: self.slice(range) }
    }
}

fn walk<'a>(text: &CharText<'a>, mappings: &'a [ChunkMapping]) -> (Vec<Segment<'a>>, usize) {
    if text.text.is_empty() || mappings.is_empty() {
        return (Vec::new(), 0);
    }

    let doc_len = text.len();
    let mut positioned: Vec<(&ChunkMapping, Range<usize>)> = mappings
        .iter()
        .filter_map(|m| m.span.range().map(|r| (m, r.start.min(doc_len)..r.end.min(doc_len))))
        .collect();
    // Stable: equal starts keep input order.
    positioned.sort_by_key(|(_, r)| r.start);

    let mut segments = Vec::with_capacity(positioned.len() * 2);
    let mut last_end = 0usize;
    for (chunk_index, (mapping, range)) in positioned.into_iter().enumerate() {
        if range.start > last_end {
            segments.push(text.segment(last_end..range.start));
        }
        let start = range.start.max(last_end);
        let end = range.end.max(start);
        segments.push(Segment::Chunk {
            start,
            end,
            content: text.slice(start..end),
            chunk_index,
            fragment_id: mapping.fragment.fragment_id.as_str(),
            chunk_type: mapping.fragment.kind().to_string(),
            page_idx: mapping.fragment.metadata.page_number(),
            match_score: mapping.span.match_score(),
        });
        last_end = last_end.max(range.end);
    }
    (segments, last_end)
}
