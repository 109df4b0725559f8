use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use manualrag_core::config::CitationSettings;
use manualrag_core::types::{CitationRecord, RetrievedFragment};

use crate::char_prefix;
use crate::reference::non_text_kind;

#[allow(clippy::expect_used)]
fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("citation pattern is a valid regex"))
}

/// Distinct citation numbers appearing as `[n]` in `response_text`.
/// Numbers too large for `u32` are ignored.
pub fn cited_numbers(response_text: &str) -> BTreeSet<u32> {
    citation_pattern()
        .captures_iter(response_text)
        .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
        .collect()
}

/// Result of scanning one response.
///
/// `cited` is every number the model wrote; `unresolved` are the ones that
/// matched no fragment (hallucinated citations). `records` is sorted by `num`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<CitationRecord>,
    pub cited: BTreeSet<u32>,
    pub unresolved: Vec<u32>,
}

impl Extraction {
    /// Whether the response contained any `[n]` marker at all.
    pub fn has_markers(&self) -> bool {
        !self.cited.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CitationExtractor {
    preview_chars: usize,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self { preview_chars: 200 }
    }
}

impl CitationExtractor {
    pub fn new(preview_chars: usize) -> Self {
        Self { preview_chars: preview_chars.max(1) }
    }

    pub fn from_settings(settings: &CitationSettings) -> Self {
        Self::new(settings.record_preview_chars)
    }

    pub fn extract(
        &self,
        response_text: &str,
        text_fragments: &[RetrievedFragment],
        non_text_fragments: &[RetrievedFragment],
    ) -> Vec<CitationRecord> {
        self.extract_detailed(response_text, text_fragments, non_text_fragments).records
    }

    pub fn extract_detailed(
        &self,
        response_text: &str,
        text_fragments: &[RetrievedFragment],
        non_text_fragments: &[RetrievedFragment],
    ) -> Extraction {
        let cited = cited_numbers(response_text);
        if cited.is_empty() {
            tracing::debug!("response contains no citation markers");
            return Extraction::default();
        }

        let mut by_num: BTreeMap<u32, CitationRecord> = BTreeMap::new();
        let tagged = text_fragments
            .iter()
            .map(|f| (f, true))
            .chain(non_text_fragments.iter().map(|f| (f, false)));
        for (fragment, is_text) in tagged {
            let Some(num) = fragment.citation_num.filter(|n| cited.contains(n)) else {
                continue;
            };
            by_num.entry(num).or_insert_with(|| self.record(num, fragment, is_text));
        }

        let unresolved: Vec<u32> = cited.iter().copied().filter(|n| !by_num.contains_key(n)).collect();
        tracing::debug!(cited = cited.len(), resolved = by_num.len(), unresolved = unresolved.len(), "extracted citations");
        Extraction { records: by_num.into_values().collect(), cited, unresolved }
    }

    fn record(&self, num: u32, fragment: &RetrievedFragment, is_text: bool) -> CitationRecord {
        let meta = &fragment.metadata;
        let (kind, preview) = if is_text {
            ("text".to_string(), char_prefix(&fragment.content, self.preview_chars).to_string())
        } else {
            let kind = non_text_kind(fragment).to_string();
            let preview = format!("{} on page {}", kind, meta.page_label());
            (kind, preview)
        };
        CitationRecord {
            num,
            kind,
            filename: meta.filename().to_string(),
            page_idx: meta.page_number(),
            fragment_id: fragment.fragment_id.clone(),
            preview,
        }
    }
}
