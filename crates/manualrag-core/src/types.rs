//! Domain types shared by the span locator, the citation pipeline and the viewer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

pub type FragmentId = String;

/// Filename reported when a fragment carries no usable `filename` metadata.
pub const UNKNOWN_FILENAME: &str = "unknown";
/// Page label reported when a fragment carries no usable `page_idx` metadata.
pub const UNKNOWN_PAGE: &str = "?";

/// A single metadata value as handed over by the retrieval source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Str(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            Self::Int(_) => None,
        }
    }

    /// Integer view of the value. Numeric strings such as `"12"` count.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Declared type of a retrieved fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FragmentKind {
    Text,
    Image,
    Table,
    Other(String),
}

impl FragmentKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "table" => Self::Table,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Table => "table",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FragmentKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FragmentKind> for String {
    fn from(value: FragmentKind) -> Self {
        value.as_str().to_string()
    }
}

/// Loosely typed metadata attached to a fragment.
///
/// Recognized keys are `filename`, `page_idx`, `type`, `path` and `summary`.
/// Every accessor is defensive: missing or mistyped values fall back to a
/// fixed default instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentMeta(HashMap<String, MetaValue>);

impl FragmentMeta {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(MetaValue::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn filename(&self) -> &str {
        self.get_str("filename").unwrap_or(UNKNOWN_FILENAME)
    }

    pub fn page_idx(&self) -> Option<i64> {
        self.get("page_idx").and_then(MetaValue::as_int)
    }

    /// Page index for numeric contexts, `0` when unknown.
    pub fn page_number(&self) -> i64 {
        self.page_idx().unwrap_or(0)
    }

    /// Page index for display contexts, `"?"` when unknown.
    pub fn page_label(&self) -> String {
        self.page_idx()
            .map_or_else(|| UNKNOWN_PAGE.to_string(), |p| p.to_string())
    }

    pub fn declared_kind(&self) -> Option<FragmentKind> {
        self.get_str("type").map(FragmentKind::parse)
    }

}

/// One chunk returned by a retrieval query.
///
/// `citation_num` is never set by the retrieval source; it is assigned once
/// per query by the citation assigner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFragment {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: FragmentMeta,
    #[serde(default)]
    pub fragment_id: FragmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_num: Option<u32>,
}

impl RetrievedFragment {
    pub fn new(fragment_id: impl Into<FragmentId>, content: impl Into<String>, metadata: FragmentMeta) -> Self {
        Self { content: content.into(), metadata, fragment_id: fragment_id.into(), citation_num: None }
    }

    /// A text fragment located in `filename` on page `page_idx`.
    pub fn text(fragment_id: &str, content: &str, filename: &str, page_idx: i64) -> Self {
        let metadata = FragmentMeta::new()
            .with("filename", filename)
            .with("page_idx", page_idx)
            .with("type", "text");
        Self::new(fragment_id, content, metadata)
    }

    /// A non-text fragment (image, table) with no inline content.
    pub fn non_text(fragment_id: &str, kind: FragmentKind, filename: &str, page_idx: i64) -> Self {
        let metadata = FragmentMeta::new()
            .with("filename", filename)
            .with("page_idx", page_idx)
            .with("type", kind.as_str());
        Self::new(fragment_id, "", metadata)
    }

    #[must_use]
    pub fn with_citation(mut self, num: u32) -> Self {
        self.citation_num = Some(num);
        self
    }

    /// Effective kind: the declared `type` when present, otherwise text for
    /// fragments with content and image for empty ones.
    pub fn kind(&self) -> FragmentKind {
        self.metadata.declared_kind().unwrap_or_else(|| {
            if self.content.trim().is_empty() { FragmentKind::Image } else { FragmentKind::Text }
        })
    }

    pub fn is_text(&self) -> bool {
        self.kind().is_text()
    }
}

/// Splits a mixed retrieval result into `(text, non_text)`, keeping order.
pub fn partition(fragments: Vec<RetrievedFragment>) -> (Vec<RetrievedFragment>, Vec<RetrievedFragment>) {
    fragments.into_iter().partition(RetrievedFragment::is_text)
}

/// A half-open character range `[start, end)` within a reference document
/// plus the confidence of the mapping. Offsets count `char`s, not bytes; use
/// [`Span::byte_range`] or [`Span::slice`] to cut the document.
///
/// A span without a range is either unmapped (score `0.0`) or a non-text
/// fragment that matched without a textual position (score `1.0`). Both
/// serialize with the `-1` sentinel for `start` and `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpanRepr", into = "SpanRepr")]
pub struct Span {
    range: Option<Range<usize>>,
    match_score: f32,
}

impl Span {
    pub const EXACT: f32 = 1.0;
    pub const BRACKETED: f32 = 0.8;
    pub const PREFIX: f32 = 0.6;
    pub const NONE: f32 = 0.0;

    pub fn new(start: usize, end: usize, match_score: f32) -> Self {
        Self { range: Some(start..end.max(start)), match_score: match_score.clamp(0.0, 1.0) }
    }

    pub fn unmapped() -> Self {
        Self { range: None, match_score: Self::NONE }
    }

    pub fn unpositioned() -> Self {
        Self { range: None, match_score: Self::EXACT }
    }

    pub fn range(&self) -> Option<Range<usize>> {
        self.range.clone()
    }

    pub fn start(&self) -> Option<usize> {
        self.range.as_ref().map(|r| r.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.range.as_ref().map(|r| r.end)
    }

    pub fn match_score(&self) -> f32 {
        self.match_score
    }

    pub fn is_positioned(&self) -> bool {
        self.range.is_some()
    }

    pub fn is_matched(&self) -> bool {
        self.match_score > 0.0
    }

    /// Start offset with the `-1` sentinel for spans without a position.
    pub fn start_pos(&self) -> i64 {
        self.start().map_or(-1, to_i64)
    }

    pub fn end_pos(&self) -> i64 {
        self.end().map_or(-1, to_i64)
    }

    /// Byte range of this span within `document`, clamped to its end.
    pub fn byte_range(&self, document: &str) -> Option<Range<usize>> {
        self.range
            .as_ref()
            .map(|r| byte_offset(document, r.start)..byte_offset(document, r.end))
    }

    /// The document text covered by this span.
    pub fn slice<'a>(&self, document: &'a str) -> Option<&'a str> {
        self.byte_range(document).and_then(|r| document.get(r))
    }
}

/// Byte offset of the `char_offset`-th character of `text`, or `text.len()`
/// past the end.
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices().nth(char_offset).map_or(text.len(), |(i, _)| i)
}

/// Number of characters that start before `byte_offset`.
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    text.char_indices().take_while(|(i, _)| *i < byte_offset).count()
}

fn to_i64(v: usize) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[derive(Serialize, Deserialize)]
struct SpanRepr {
    start: i64,
    end: i64,
    match_score: f32,
}

impl From<SpanRepr> for Span {
    fn from(repr: SpanRepr) -> Self {
        match (usize::try_from(repr.start), usize::try_from(repr.end)) {
            (Ok(start), Ok(end)) if end >= start => Span::new(start, end, repr.match_score),
            _ => Span { range: None, match_score: repr.match_score.clamp(0.0, 1.0) },
        }
    }
}

impl From<Span> for SpanRepr {
    fn from(span: Span) -> Self {
        SpanRepr { start: span.start_pos(), end: span.end_pos(), match_score: span.match_score }
    }
}

/// One retrieved fragment paired with its location in a reference document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMapping {
    pub fragment: RetrievedFragment,
    pub span: Span,
}

/// A fragment that the model actually cited, ready for the PDF viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub num: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: String,
    pub page_idx: i64,
    pub fragment_id: FragmentId,
    pub preview: String,
}

/// Full text of one source document, addressed by filename. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    pub filename: String,
    pub text: String,
}

impl ReferenceDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self { filename: filename.into(), text: text.into() }
    }
}
