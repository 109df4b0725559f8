use std::fs;
use tempfile::TempDir;

use figment::providers::{Format, Toml};
use figment::Figment;
use manualrag_core::config::Config;
use manualrag_core::store::{FsDocumentStore, InMemoryHistory};
use manualrag_core::traits::{DocumentStore, HistoryStore};
use manualrag_core::types::{partition, FragmentKind, FragmentMeta, RetrievedFragment, Span};

#[test]
fn metadata_defaults_when_fields_missing() {
    let meta = FragmentMeta::new();
    assert_eq!(meta.filename(), "unknown");
    assert_eq!(meta.page_idx(), None);
    assert_eq!(meta.page_number(), 0);
    assert_eq!(meta.page_label(), "?");
    assert_eq!(meta.declared_kind(), None);
}

#[test]
fn metadata_accepts_numeric_strings_for_page() {
    let meta = FragmentMeta::new().with("page_idx", "12").with("filename", "manual");
    assert_eq!(meta.page_idx(), Some(12));
    assert_eq!(meta.filename(), "manual");

    let garbage = FragmentMeta::new().with("page_idx", "twelve");
    assert_eq!(garbage.page_label(), "?");
}

#[test]
fn metadata_deserializes_mixed_values() {
    let json = r#"{"content":"x","metadata":{"filename":"doc1","page_idx":3,"type":"table"},"fragment_id":"f1"}"#;
    let fragment: RetrievedFragment = serde_json::from_str(json).expect("parse");
    assert_eq!(fragment.metadata.page_idx(), Some(3));
    assert_eq!(fragment.kind(), FragmentKind::Table);
    assert_eq!(fragment.citation_num, None);
}

#[test]
fn kind_is_inferred_from_content_when_undeclared() {
    let text = RetrievedFragment::new("a", "Torque the bolt.", FragmentMeta::new());
    let empty = RetrievedFragment::new("b", "", FragmentMeta::new());
    assert_eq!(text.kind(), FragmentKind::Text);
    assert_eq!(empty.kind(), FragmentKind::Image);
}

#[test]
fn partition_keeps_retrieval_order() {
    let fragments = vec![
        RetrievedFragment::text("t1", "one", "doc", 1),
        RetrievedFragment::non_text("i1", FragmentKind::Image, "doc", 2),
        RetrievedFragment::text("t2", "two", "doc", 3),
        RetrievedFragment::non_text("tb1", FragmentKind::Table, "doc", 4),
    ];
    let (text, non_text) = partition(fragments);
    let ids: Vec<_> = text.iter().map(|f| f.fragment_id.as_str()).collect();
    assert_eq!(ids, ["t1", "t2"]);
    let ids: Vec<_> = non_text.iter().map(|f| f.fragment_id.as_str()).collect();
    assert_eq!(ids, ["i1", "tb1"]);
}

#[test]
fn span_serializes_with_sentinel() {
    let unmapped = serde_json::to_value(Span::unmapped()).expect("json");
    assert_eq!(unmapped["start"], -1);
    assert_eq!(unmapped["end"], -1);
    assert_eq!(unmapped["match_score"], 0.0);

    let positioned: Span = serde_json::from_str(r#"{"start":7,"end":23,"match_score":1.0}"#).expect("parse");
    assert_eq!(positioned.range(), Some(7..23));

    let unpositioned: Span = serde_json::from_str(r#"{"start":-1,"end":-1,"match_score":1.0}"#).expect("parse");
    assert!(!unpositioned.is_positioned());
    assert!(unpositioned.is_matched());
}

#[test]
fn settings_defaults_and_overrides() {
    let config = Config::from_figment(Figment::new()).expect("empty config");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.text_results, 3);
    assert_eq!(settings.retrieval.non_text_results, 2);
    assert_eq!(settings.citation.reference_preview_chars, 500);
    assert_eq!(settings.citation.record_preview_chars, 200);
    assert_eq!(settings.locate.prefix_chars, 50);

    let figment = Figment::new().merge(Toml::string("[retrieval]\ntext_results = 5\n"));
    let config = Config::from_figment(figment).expect("config");
    assert_eq!(config.settings().expect("settings").retrieval.text_results, 5);
    let k: usize = config.get("retrieval.text_results").expect("get");
    assert_eq!(k, 5);
}

#[test]
fn settings_reject_template_without_placeholders() {
    let figment = Figment::new().merge(Toml::string("[prompt]\ntemplate = \"Answer: {question}\"\n"));
    assert!(Config::from_figment(figment).is_err());

    let figment = Figment::new().merge(Toml::string("[locate]\nprefix_chars = 0\n"));
    assert!(Config::from_figment(figment).is_err());
}

#[test]
fn fs_store_resolves_extension_and_lists() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("manual.md"), "# Manual\nStep one.").unwrap();
    fs::write(tmp.path().join("notes.txt"), "notes").unwrap();
    fs::write(tmp.path().join("image.png"), [0u8, 1, 2]).unwrap();

    let store = FsDocumentStore::new(tmp.path());
    let doc = store.load("manual").expect("load");
    assert_eq!(doc.filename, "manual");
    assert!(doc.text.contains("Step one."));
    assert!(store.load("manual.md").is_ok());
    assert!(store.load("missing").is_err());

    assert_eq!(store.list().expect("list"), vec!["manual".to_string(), "notes".to_string()]);
}

#[test]
fn in_memory_history_is_keyed_by_session() {
    let history = InMemoryHistory::new();
    history.append("s1", "first".to_string()).unwrap();
    history.append("s1", "second".to_string()).unwrap();
    history.append("s2", "other".to_string()).unwrap();

    assert_eq!(history.messages("s1"), vec!["first".to_string(), "second".to_string()]);
    assert_eq!(history.messages("s2").len(), 1);
    assert!(history.messages("nope").is_empty());
    assert_eq!(history.session_count(), 2);
}
