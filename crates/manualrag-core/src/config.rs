//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys split on `__`, e.g. `APP_CITATION__RECORD_PREVIEW_CHARS`).
//! [`Settings`] is the typed view used by the pipeline and the CLI; every
//! field has a default so an empty configuration is valid.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub const CONTEXT_PLACEHOLDER: &str = "{context_info}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built from a TOML string.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        self.settings()
            .map_err(|e| anyhow::anyhow!("Invalid configuration for env '{}': {}", env, e))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub citation: CitationSettings,
    pub locate: LocateSettings,
    pub prompt: PromptSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.citation.reference_preview_chars == 0 {
            return Err(Error::InvalidConfig("citation.reference_preview_chars must be > 0".into()));
        }
        if self.citation.record_preview_chars == 0 {
            return Err(Error::InvalidConfig("citation.record_preview_chars must be > 0".into()));
        }
        if self.locate.prefix_chars == 0 {
            return Err(Error::InvalidConfig("locate.prefix_chars must be > 0".into()));
        }
        if let Some(template) = &self.prompt.template {
            for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
                if !template.contains(placeholder) {
                    return Err(Error::InvalidConfig(format!("prompt.template is missing {placeholder}")));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub documents_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { documents_dir: "./.data/result".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub text_results: usize,
    pub non_text_results: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { text_results: 3, non_text_results: 2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationSettings {
    /// Characters of text content shown per source in the model prompt.
    pub reference_preview_chars: usize,
    /// Characters of text content carried in a `CitationRecord` preview.
    pub record_preview_chars: usize,
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self { reference_preview_chars: 500, record_preview_chars: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateSettings {
    pub prefix_chars: usize,
}

impl Default for LocateSettings {
    fn default() -> Self {
        Self { prefix_chars: 50 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Overrides the built-in template. Must contain `{context_info}` and `{question}`.
    pub template: Option<String>,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
