use manualrag_core::config::{PromptSettings, CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
use manualrag_core::error::{Error, Result};

const NO_SOURCES: &str = "(No reference sources were retrieved for this question.)";

pub const DEFAULT_TEMPLATE: &str = r#"# Context Information
{context_info}

-----

# Instructions

Read the context first. Then answer the user's question step by step, following these rules:

1. Match the style of the answer to the question. If the question asks for steps, stay faithful to the source text and do not summarize. If it asks for a summary, summarize.
2. Answer only from the numbered sources above. If they are insufficient or unrelated to the question, say "I cannot answer this question based on the provided context." Do not make up answers.
3. Immediately after every sentence that uses a source, append that source's number in square brackets, for example [1] or [2][4].
4. Use only the bare [n] form. Do not write "Source 1", "according to [1]" or any other citation wording.
5. Be clear, concise and factually accurate. Do not guess or suggest technical steps that are not in the sources.

-----

# User Question
{question}
"#;

/// Renders the reference block and the question into the model prompt.
///
/// Rendering is a single pass over the template, so placeholder-like text
/// inside the question or the sources is copied verbatim and never expanded.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    template: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl PromptComposer {
    pub fn with_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(Error::InvalidConfig(format!("prompt template is missing {placeholder}")));
            }
        }
        Ok(Self { template })
    }

    pub fn from_settings(settings: &PromptSettings) -> Result<Self> {
        match &settings.template {
            Some(template) => Self::with_template(template.clone()),
            None => Ok(Self::default()),
        }
    }

    pub fn compose(&self, question: &str, reference_block: &str) -> String {
        let context = if reference_block.trim().is_empty() { NO_SOURCES } else { reference_block };
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        loop {
            let next = [(CONTEXT_PLACEHOLDER, context), (QUESTION_PLACEHOLDER, question)]
                .into_iter()
                .filter_map(|(placeholder, value)| rest.find(placeholder).map(|at| (at, placeholder, value)))
                .min_by_key(|(at, _, _)| *at);
            match next {
                Some((at, placeholder, value)) => {
                    out.push_str(&rest[..at]);
                    out.push_str(value);
                    rest = &rest[at + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }
        out
    }
}
