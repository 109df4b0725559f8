use manualrag_core::config::LocateSettings;
use manualrag_core::types::{ChunkMapping, RetrievedFragment};

use crate::locate::SpanLocator;

/// Locates every fragment of a retrieval result inside one reference document.
#[derive(Debug, Clone, Default)]
pub struct ChunkMapper {
    locator: SpanLocator,
}

impl ChunkMapper {
    pub fn new(locator: SpanLocator) -> Self {
        Self { locator }
    }

    pub fn from_settings(settings: &LocateSettings) -> Self {
        Self::new(SpanLocator::from_settings(settings))
    }

    /// One mapping per fragment, in input order. An empty document or an
    /// empty fragment list yields no mappings.
    pub fn map(&self, document_text: &str, fragments: &[RetrievedFragment]) -> Vec<ChunkMapping> {
        if document_text.is_empty() || fragments.is_empty() {
            return Vec::new();
        }

        let mappings: Vec<ChunkMapping> = fragments
            .iter()
            .map(|fragment| {
                let span = self.locator.locate_fragment(fragment, document_text);
                tracing::debug!(
                    fragment_id = %fragment.fragment_id,
                    start = span.start_pos(),
                    end = span.end_pos(),
                    score = span.match_score(),
                    "mapped fragment"
                );
                ChunkMapping { fragment: fragment.clone(), span }
            })
            .collect();

        let unmapped = mappings.iter().filter(|m| !m.span.is_matched()).count();
        if unmapped > 0 {
            tracing::warn!(unmapped, total = mappings.len(), "fragments could not be located in the document");
        }
        mappings
    }
}
