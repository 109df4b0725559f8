use std::collections::HashSet;

use manualrag_cite::prompt::DEFAULT_TEMPLATE;
use manualrag_cite::{
    assign, build_reference_block, cited_numbers, format_history_block, CitationExtractor, PromptComposer,
    ReferenceFormatter,
};
use manualrag_core::types::{FragmentKind, FragmentMeta, RetrievedFragment};

fn sample() -> (Vec<RetrievedFragment>, Vec<RetrievedFragment>) {
    let text = vec![
        RetrievedFragment::text("t-a", "Drain the hydraulic reservoir before removing the pump.", "manual", 12),
        RetrievedFragment::text("t-b", "Torque the mounting bolts to 25 Nm.", "manual", 13),
        RetrievedFragment::text("t-c", "Check the filter indicator weekly.", "service-guide", 2),
    ];
    let non_text = vec![
        RetrievedFragment::non_text("img-1", FragmentKind::Image, "manual", 14),
        RetrievedFragment::non_text("tbl-1", FragmentKind::Table, "manual", 15),
    ];
    (text, non_text)
}

#[test]
fn assign_numbers_text_then_non_text_without_gaps() {
    let (text, non_text) = sample();
    let (text, non_text) = assign(&text, &non_text);

    let text_nums: Vec<u32> = text.iter().filter_map(|f| f.citation_num).collect();
    let non_text_nums: Vec<u32> = non_text.iter().filter_map(|f| f.citation_num).collect();
    assert_eq!(text_nums, vec![1, 2, 3]);
    assert_eq!(non_text_nums, vec![4, 5]);

    let all: HashSet<u32> = text_nums.iter().chain(non_text_nums.iter()).copied().collect();
    assert_eq!(all, (1..=5).collect::<HashSet<u32>>());
    assert!(text_nums.iter().max() < non_text_nums.iter().min());
}

#[test]
fn assign_handles_empty_kinds() {
    let (_, non_text) = sample();
    let (text, non_text) = assign(&[], &non_text);
    assert!(text.is_empty());
    assert_eq!(non_text[0].citation_num, Some(1));

    let (text, non_text) = assign(&[], &[]);
    assert!(text.is_empty() && non_text.is_empty());
    assert_eq!(build_reference_block(&text, &non_text), "");
}

#[test]
fn reference_block_previews_text_and_describes_non_text() {
    let long = "x".repeat(800);
    let text = vec![RetrievedFragment::text("long", &long, "manual", 1)];
    let non_text = vec![RetrievedFragment::new("img", "", FragmentMeta::new())];
    let (text, non_text) = assign(&text, &non_text);
    let block = build_reference_block(&text, &non_text);

    assert!(block.starts_with("[1] Source: manual, page 1\n"));
    assert!(block.contains(&format!("{}...", "x".repeat(500))));
    assert!(!block.contains(&"x".repeat(501)));
    assert!(block.contains("[2] Source: unknown, page ?\nType: image"));

    let short = ReferenceFormatter::new(3).build(&text, &[]);
    assert!(short.ends_with("xxx..."));
}

#[test]
fn compose_contains_question_and_every_citation() {
    let (text, non_text) = sample();
    let (text, non_text) = assign(&text, &non_text);
    let question = "How do I remove the hydraulic pump?";
    let prompt = PromptComposer::default().compose(question, &build_reference_block(&text, &non_text));

    assert!(prompt.contains(question));
    for n in 1..=5 {
        assert!(prompt.contains(&format!("[{n}] Source:")), "missing citation {n}");
    }
}

#[test]
fn compose_is_pure_and_does_not_expand_placeholders_in_inputs() {
    let composer = PromptComposer::default();
    let question = "What does {context_info} mean?";
    let block = "[1] Source: manual, page 1\nThe {question} field is free text.";
    let a = composer.compose(question, block);
    let b = composer.compose(question, block);
    assert_eq!(a, b);
    assert!(a.contains(question));
    assert!(a.contains(block));
}

#[test]
fn compose_keeps_long_reference_blocks_intact() {
    let block = "[1] Source: manual, page 1\n".to_string() + &"y".repeat(100_000);
    let prompt = PromptComposer::default().compose("q", &block);
    assert!(prompt.contains(&block));
    assert!(prompt.len() > DEFAULT_TEMPLATE.len() + block.len() - 100);
}

#[test]
fn compose_with_empty_block_still_renders() {
    let prompt = PromptComposer::default().compose("Where is the fuse?", "");
    assert!(prompt.contains("Where is the fuse?"));
    assert!(prompt.contains("No reference sources"));
}

#[test]
fn custom_template_requires_both_placeholders() {
    assert!(PromptComposer::with_template("Q: {question}").is_err());
    let composer = PromptComposer::with_template("C: {context_info} | Q: {question}").expect("template");
    assert_eq!(composer.compose("why?", "[1] a"), "C: [1] a | Q: why?");
}

#[test]
fn extract_dedups_sorts_and_drops_missing() {
    let text = vec![
        RetrievedFragment::text("a", "alpha", "doc", 1).with_citation(1),
        RetrievedFragment::text("b", "beta", "doc", 2).with_citation(2),
        RetrievedFragment::text("c", "gamma", "doc", 3).with_citation(3),
    ];
    let records = CitationExtractor::default().extract("See [3]. Also [1] and again [1].", &text, &[]);
    let nums: Vec<u32> = records.iter().map(|r| r.num).collect();
    assert_eq!(nums, vec![1, 3]);
    assert_eq!(records[0].fragment_id, "a");
    assert_eq!(records[1].preview, "gamma");
}

#[test]
fn extract_reports_hallucinated_numbers() {
    let (text, non_text) = sample();
    let (text, non_text) = assign(&text, &non_text);
    let extraction = CitationExtractor::default().extract_detailed("Done [2][9]. Picture [4].", &text, &non_text);

    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.unresolved, vec![9]);
    let image = &extraction.records[1];
    assert_eq!(image.num, 4);
    assert_eq!(image.kind, "image");
    assert_eq!(image.filename, "manual");
    assert_eq!(image.page_idx, 14);
    assert_eq!(image.preview, "image on page 14");
}

#[test]
fn extract_without_markers_is_empty() {
    let (text, non_text) = sample();
    let (text, non_text) = assign(&text, &non_text);
    let extraction = CitationExtractor::default().extract_detailed("No sources were used here.", &text, &non_text);
    assert!(extraction.records.is_empty());
    assert!(!extraction.has_markers());
    assert!(CitationExtractor::default().extract("", &[], &[]).is_empty());
}

#[test]
fn extract_defaults_for_malformed_metadata() {
    let non_text = vec![RetrievedFragment::new("bare", "", FragmentMeta::new()).with_citation(1)];
    let records = CitationExtractor::default().extract("[1]", &[], &non_text);
    assert_eq!(records[0].kind, "image");
    assert_eq!(records[0].filename, "unknown");
    assert_eq!(records[0].page_idx, 0);
    assert_eq!(records[0].preview, "image on page ?");
}

#[test]
fn text_preview_is_bounded() {
    let text = vec![RetrievedFragment::text("a", &"z".repeat(300), "doc", 1).with_citation(1)];
    let records = CitationExtractor::default().extract("[1]", &text, &[]);
    assert_eq!(records[0].preview.chars().count(), 200);
    assert_eq!(records[0].kind, "text");
}

#[test]
fn cited_numbers_ignores_non_numeric_brackets() {
    let nums = cited_numbers("[1] [a] [ 2 ] [03] [99999999999] [[4]]");
    assert_eq!(nums.into_iter().collect::<Vec<_>>(), vec![1, 3, 4]);
}

#[test]
fn history_block_lists_every_source() {
    let (text, non_text) = sample();
    let (text, non_text) = assign(&text, &non_text);
    let block = format_history_block(&text, &non_text);
    assert!(block.starts_with("=== REFERENCED CONTEXT FROM RAG RETRIEVAL ==="));
    assert_eq!(block.matches("[Source").count(), 5);
    assert!(block.contains("[Source 5] manual, page 15\ntable on page 15"));
    assert_eq!(format_history_block(&[], &[]), "");
}

#[test]
fn citation_record_serializes_type_field() {
    let text = vec![RetrievedFragment::text("a", "alpha", "doc", 1).with_citation(1)];
    let records = CitationExtractor::default().extract("[1]", &text, &[]);
    let json = serde_json::to_value(&records[0]).expect("json");
    assert_eq!(json["type"], "text");
    assert_eq!(json["num"], 1);
}
