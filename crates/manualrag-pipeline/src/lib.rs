//! manualrag-pipeline
//!
//! Per-query orchestration: retrieve, number, prompt, generate, extract,
//! record history. Every collaborator is passed in explicitly; the pipeline
//! holds no per-query state, so one instance can serve concurrent queries.
use serde::Serialize;

use manualrag_align::ChunkMapper;
use manualrag_cite::{assign, format_history_block, CitationExtractor, PromptComposer, ReferenceFormatter};
use manualrag_core::config::Settings;
use manualrag_core::error::{Error, Result};
use manualrag_core::traits::{DocumentStore, HistoryStore, LanguageModel, RetrievalKind, Retriever};
use manualrag_core::types::{ChunkMapping, CitationRecord, RetrievedFragment};

/// Numbered fragments and the prompt built from them, before the model runs.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedQuery {
    pub question: String,
    pub prompt: String,
    pub text_fragments: Vec<RetrievedFragment>,
    pub non_text_fragments: Vec<RetrievedFragment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub response: String,
    pub citations: Vec<CitationRecord>,
    pub text_fragments: Vec<RetrievedFragment>,
    pub non_text_fragments: Vec<RetrievedFragment>,
    /// Numbers the model cited that match no retrieved fragment.
    pub unresolved: Vec<u32>,
}

pub struct CitationPipeline<R, M>
where
    R: Retriever,
    M: LanguageModel,
{
    retriever: R,
    model: M,
    settings: Settings,
    mapper: ChunkMapper,
    formatter: ReferenceFormatter,
    composer: PromptComposer,
    extractor: CitationExtractor,
}

impl<R, M> CitationPipeline<R, M>
where
    R: Retriever,
    M: LanguageModel,
{
    pub fn new(retriever: R, model: M, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            mapper: ChunkMapper::from_settings(&settings.locate),
            formatter: ReferenceFormatter::from_settings(&settings.citation),
            composer: PromptComposer::from_settings(&settings.prompt)?,
            extractor: CitationExtractor::from_settings(&settings.citation),
            retriever,
            model,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Retrieve both fragment kinds, number them and compose the prompt.
    pub fn prepare(&self, question: &str) -> Result<PreparedQuery> {
        let text = self.retrieve(question, RetrievalKind::Text, self.settings.retrieval.text_results)?;
        let non_text = self.retrieve(question, RetrievalKind::NonText, self.settings.retrieval.non_text_results)?;
        if text.is_empty() && non_text.is_empty() {
            tracing::warn!(question, "retrieval returned no fragments");
        }

        let (text_fragments, non_text_fragments) = assign(&text, &non_text);
        let reference_block = self.formatter.build(&text_fragments, &non_text_fragments);
        let prompt = self.composer.compose(question, &reference_block);
        Ok(PreparedQuery { question: question.to_string(), prompt, text_fragments, non_text_fragments })
    }

    pub fn answer(&self, session_id: &str, question: &str, history: &dyn HistoryStore) -> Result<Answer> {
        tracing::info!(session_id, question, "answering question");
        let prepared = self.prepare(question)?;

        let response = self
            .model
            .generate(&prepared.prompt)
            .map_err(|e| Error::Generation(format!("{e:#}")))?;

        let extraction =
            self.extractor
                .extract_detailed(&response, &prepared.text_fragments, &prepared.non_text_fragments);
        if !extraction.has_markers() {
            tracing::info!(session_id, "response cites no sources");
        }
        if !extraction.unresolved.is_empty() {
            tracing::warn!(session_id, unresolved = ?extraction.unresolved, "response cites unknown sources");
        }

        let block = format_history_block(&prepared.text_fragments, &prepared.non_text_fragments);
        if !block.is_empty() {
            history
                .append(session_id, block)
                .map_err(|e| Error::History(format!("{e:#}")))?;
        }

        Ok(Answer {
            response,
            citations: extraction.records,
            text_fragments: prepared.text_fragments,
            non_text_fragments: prepared.non_text_fragments,
            unresolved: extraction.unresolved,
        })
    }

    /// Map fragments onto the reference document named `filename`.
    ///
    /// Store errors that are already an [`Error`] (a missing document, I/O)
    /// pass through unchanged; anything else becomes [`Error::DocumentStore`].
    pub fn map_document(
        &self,
        store: &dyn DocumentStore,
        filename: &str,
        fragments: &[RetrievedFragment],
    ) -> Result<Vec<ChunkMapping>> {
        let document = store.load(filename).map_err(|e| match e.downcast::<Error>() {
            Ok(err) => err,
            Err(other) => Error::DocumentStore(format!("{other:#}")),
        })?;
        Ok(self.mapper.map(&document.text, fragments))
    }

    fn retrieve(&self, question: &str, kind: RetrievalKind, k: usize) -> Result<Vec<RetrievedFragment>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let fragments = self
            .retriever
            .retrieve(question, kind, k)
            .map_err(|e| Error::Retrieval(format!("{e:#}")))?;
        tracing::debug!(?kind, count = fragments.len(), "retrieved fragments");
        Ok(fragments)
    }
}
