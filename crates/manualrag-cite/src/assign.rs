use manualrag_core::types::RetrievedFragment;

/// Number fragments for one query: text fragments `1..=N` in retrieval
/// order, then non-text fragments `N+1..=N+M`. Inputs are left untouched and
/// any previous numbering on them is replaced.
pub fn assign(
    text_fragments: &[RetrievedFragment],
    non_text_fragments: &[RetrievedFragment],
) -> (Vec<RetrievedFragment>, Vec<RetrievedFragment>) {
    let mut numbers = 1u32..;
    let mut number = |fragments: &[RetrievedFragment]| -> Vec<RetrievedFragment> {
        fragments
            .iter()
            .zip(numbers.by_ref())
            .map(|(fragment, num)| fragment.clone().with_citation(num))
            .collect()
    };
    let text = number(text_fragments);
    let non_text = number(non_text_fragments);
    tracing::debug!(text = text.len(), non_text = non_text.len(), "assigned citation numbers");
    (text, non_text)
}
