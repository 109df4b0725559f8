//! manualrag-cite
//!
//! Citation numbering, the numbered reference block handed to the model, the
//! prompt template, and extraction of the citations a response actually used.
pub mod assign;
pub mod extract;
pub mod prompt;
pub mod reference;

pub use assign::assign;
pub use extract::{cited_numbers, CitationExtractor, Extraction};
pub use prompt::PromptComposer;
pub use reference::{build_reference_block, format_history_block, ReferenceFormatter};

/// The first `max_chars` characters of `text`.
pub(crate) fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
