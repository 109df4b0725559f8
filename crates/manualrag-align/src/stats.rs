use serde::Serialize;
use std::collections::BTreeSet;

use manualrag_core::types::{ChunkMapping, FragmentKind};

/// Summary of a mapping run, as shown at the top of the chunk viewer.
///
/// `positioned_chunks` counts spans with a document position. `mapped_chunks`
/// counts every mapping with a non-zero score, which includes non-text
/// fragments; `unmapped_chunks` is the complement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingStats {
    pub total_chunks: usize,
    pub text_chunks: usize,
    pub image_chunks: usize,
    pub table_chunks: usize,
    pub other_chunks: usize,
    pub pages: Vec<i64>,
    pub avg_text_length: f64,
    pub positioned_chunks: usize,
    pub mapped_chunks: usize,
    pub unmapped_chunks: usize,
}

impl MappingStats {
    pub fn collect(mappings: &[ChunkMapping]) -> Self {
        let mut stats = Self { total_chunks: mappings.len(), ..Self::default() };
        let mut pages = BTreeSet::new();
        let mut text_chars = 0usize;

        for mapping in mappings {
            match mapping.fragment.kind() {
                FragmentKind::Text => {
                    stats.text_chunks += 1;
                    text_chars += mapping.fragment.content.chars().count();
                }
                FragmentKind::Image => stats.image_chunks += 1,
                FragmentKind::Table => stats.table_chunks += 1,
                FragmentKind::Other(_) => stats.other_chunks += 1,
            }
            pages.insert(mapping.fragment.metadata.page_number());
            if mapping.span.is_positioned() {
                stats.positioned_chunks += 1;
            }
            if mapping.span.is_matched() {
                stats.mapped_chunks += 1;
            } else {
                stats.unmapped_chunks += 1;
            }
        }

        stats.pages = pages.into_iter().collect();
        if stats.text_chunks > 0 {
            #[allow(clippy::cast_precision_loss)]
            let avg = text_chars as f64 / stats.text_chunks as f64;
            stats.avg_text_length = avg;
        }
        stats
    }
}
