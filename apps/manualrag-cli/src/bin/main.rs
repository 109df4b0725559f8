use std::env;
use std::fs;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use manualrag_align::{cover, ChunkMapper, Confidence, MappingStats, Segment};
use manualrag_cli::{group_by_filename, init_logging, load_fragments, FileRetriever, ReplayModel};
use manualrag_core::config::{expand_path, Config};
use manualrag_core::store::{FsDocumentStore, InMemoryHistory};
use manualrag_core::traits::DocumentStore;
use manualrag_pipeline::CitationPipeline;

const USAGE: &str = "Usage: manualrag <command> [args...]

Commands:
  map <document> <fragments.json> [--json]      locate fragments in one document
  report [documents_dir] <fragments.json>       map fragments against every document
  prompt <question> <fragments.json>            print the composed prompt
  replay <question> <fragments.json> <response> run the citation flow on a saved response";

fn parse_args() -> (String, Vec<String>, bool) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    let json = args.iter().any(|a| a == "--json");
    let positional = args.into_iter().filter(|a| !a.starts_with("--")).collect();
    (cmd, positional, json)
}

fn usage_error(msg: &str) -> ! {
    eprintln!("Error: {msg}\n\n{USAGE}");
    std::process::exit(1)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args, json) = parse_args();

    match cmd.as_str() {
        "map" => {
            let [document, fragments] = args.as_slice() else { usage_error("map expects <document> <fragments.json>") };
            let text = fs::read_to_string(document)?;
            let fragments = load_fragments(&PathBuf::from(fragments))?;
            let mappings = ChunkMapper::from_settings(&settings.locate).map(&text, &fragments);
            let segments = cover(&text, &mappings);
            if json {
                let out = serde_json::json!({ "stats": MappingStats::collect(&mappings), "segments": segments });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            println!("📄 {} ({} chars, {} fragments)", document, text.chars().count(), fragments.len());
            print_stats(&MappingStats::collect(&mappings));
            println!("\n🧩 Segments:");
            for segment in &segments {
                match segment {
                    Segment::Text { start, end, .. } => println!("  · text  [{start}..{end})"),
                    Segment::Chunk { start, end, chunk_index, fragment_id, chunk_type, page_idx, match_score, .. } => println!(
                        "  ▶ chunk {} [{start}..{end}) {chunk_type} page {page_idx} {} ({match_score:.2}) id={fragment_id}",
                        chunk_index + 1,
                        Confidence::from_score(*match_score).label()
                    ),
                }
            }
            for mapping in mappings.iter().filter(|m| !m.span.is_matched()) {
                println!("  ❌ not found in document: {}", mapping.fragment.fragment_id);
            }
        }
        "report" => {
            let (dir, fragments) = match args.as_slice() {
                [fragments] => (settings.data.documents_dir.clone(), fragments.clone()),
                [dir, fragments] => (dir.clone(), fragments.clone()),
                _ => usage_error("report expects [documents_dir] <fragments.json>"),
            };
            let store = FsDocumentStore::new(expand_path(&dir));
            let fragments = load_fragments(&PathBuf::from(fragments))?;
            let groups = group_by_filename(&fragments);
            let mapper = ChunkMapper::from_settings(&settings.locate);
            println!("📚 Documents under {}: {}", store.root().display(), store.list()?.len());

            let pb = ProgressBar::new(groups.len() as u64);
            pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")?.progress_chars("#>-"));
            let mut rows = Vec::new();
            let mut missing = Vec::new();
            for (filename, group) in &groups {
                pb.set_message(filename.clone());
                match store.load(filename) {
                    Ok(document) => rows.push((filename.clone(), MappingStats::collect(&mapper.map(&document.text, group)))),
                    Err(e) => {
                        tracing::warn!(filename = %filename, error = %e, "no reference document for fragments");
                        missing.push((filename.clone(), group.len()));
                    }
                }
                pb.inc(1);
            }
            pb.finish_with_message("✅ mapping complete");

            for (filename, stats) in &rows {
                println!(
                    "\n  {filename}: {} fragments, {} mapped, {} unmapped, {} positioned",
                    stats.total_chunks, stats.mapped_chunks, stats.unmapped_chunks, stats.positioned_chunks
                );
            }
            for (filename, count) in &missing {
                println!("\n  ⚠️  {filename}: {count} fragments, document not found");
            }
        }
        "prompt" => {
            let [question, fragments] = args.as_slice() else { usage_error("prompt expects <question> <fragments.json>") };
            let retriever = FileRetriever::from_path(&PathBuf::from(fragments))?;
            let pipeline = CitationPipeline::new(retriever, ReplayModel::default(), settings)?;
            println!("{}", pipeline.prepare(question)?.prompt);
        }
        "replay" => {
            let [question, fragments, response] = args.as_slice() else { usage_error("replay expects <question> <fragments.json> <response>") };
            let retriever = FileRetriever::from_path(&PathBuf::from(fragments))?;
            let model = ReplayModel::from_path(&PathBuf::from(response))?;
            let pipeline = CitationPipeline::new(retriever, model, settings)?;
            let history = InMemoryHistory::new();
            let answer = pipeline.answer("cli", question, &history)?;
            println!("{}", serde_json::to_string_pretty(&answer.citations)?);
            if !answer.unresolved.is_empty() {
                eprintln!("⚠️  cited numbers with no matching source: {:?}", answer.unresolved);
            }
        }
        _ => usage_error(&format!("unknown command: {cmd}")),
    }
    Ok(())
}

fn print_stats(stats: &MappingStats) {
    println!("\n📊 Mapping statistics:");
    println!("  Total chunks:       {}", stats.total_chunks);
    println!("  Text chunks:        {}", stats.text_chunks);
    println!("  Images/Tables:      {}", stats.image_chunks + stats.table_chunks + stats.other_chunks);
    println!("  Pages:              {:?}", stats.pages);
    println!("  Mapped to document: {}", stats.mapped_chunks);
    println!("  Not mapped:         {}", stats.unmapped_chunks);
    if stats.text_chunks > 0 {
        println!("  Avg text length:    {:.0} chars", stats.avg_text_length);
    }
}
