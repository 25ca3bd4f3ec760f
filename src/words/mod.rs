mod ollama;
mod openai;
mod rae;

use async_trait::async_trait;
use std::time::Duration;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;
pub use rae::RaeWordSource;

/// Result type for word-provider operations
pub type WordResult<T> = Result<T, WordError>;

/// Errors that can occur while talking to the word providers
#[derive(Debug, thiserror::Error)]
pub enum WordError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// Best-effort provider of a random candidate word. Failures fall back to
/// the configured seed word.
#[async_trait]
pub trait WordSource: Send + Sync {
    async fn candidate_word(&self) -> WordResult<String>;

    fn name(&self) -> &str;
}

/// Turns a candidate word into the authoritative secret word for a round.
/// A failure here aborts the round start.
#[async_trait]
pub trait WordGenerator: Send + Sync {
    /// `correlation_id` is a fresh per-request identifier, embedded in the
    /// prompt so repeated requests don't collapse into identical outputs.
    async fn refine_word(&self, candidate: &str, correlation_id: &str) -> WordResult<String>;

    fn name(&self) -> &str;
}

/// Configuration for the word providers
#[derive(Debug, Clone)]
pub struct WordConfig {
    /// Base URL of the random-word API
    pub rae_base_url: Option<String>,
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Ollama base URL
    pub ollama_base_url: Option<String>,
    /// Ollama model to use
    pub ollama_model: String,
    /// Per-call timeout for outbound requests
    pub request_timeout: Duration,
    /// Seed word used when the random-word API is unavailable
    pub fallback_word: String,
}

impl Default for WordConfig {
    fn default() -> Self {
        Self {
            rae_base_url: Some("https://rae-api.com".to_string()),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: Some("http://localhost:11434".to_string()),
            ollama_model: "llama3.2:3b".to_string(),
            request_timeout: Duration::from_secs(5),
            fallback_word: "mesa".to_string(),
        }
    }
}

impl WordConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let non_empty = |value: String| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        let rae_base_url = match std::env::var("RAE_API_URL") {
            Ok(url) => non_empty(url),
            Err(_) => defaults.rae_base_url,
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().and_then(non_empty);

        let openai_model = std::env::var("OPENAI_MODEL")
            .ok()
            .and_then(non_empty)
            .unwrap_or(defaults.openai_model);

        let ollama_base_url = match std::env::var("OLLAMA_BASE_URL") {
            Ok(url) => non_empty(url),
            Err(_) => defaults.ollama_base_url,
        };

        let ollama_model = std::env::var("OLLAMA_MODEL")
            .ok()
            .and_then(non_empty)
            .unwrap_or(defaults.ollama_model);

        Self {
            rae_base_url,
            openai_api_key,
            openai_model,
            ollama_base_url,
            ollama_model,
            request_timeout: std::env::var("WORD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            fallback_word: std::env::var("FALLBACK_WORD")
                .ok()
                .and_then(non_empty)
                .unwrap_or(defaults.fallback_word),
        }
    }

    /// Build a WordService from the configured providers. OpenAI wins over
    /// Ollama when both are configured; with no generator at all the
    /// candidate word is used as-is.
    pub fn build_service(&self) -> WordService {
        let source: Option<Box<dyn WordSource>> = self
            .rae_base_url
            .as_ref()
            .map(|url| Box::new(RaeWordSource::new(url.clone(), self.request_timeout)) as _);

        let generator: Option<Box<dyn WordGenerator>> = if let Some(key) = &self.openai_api_key {
            Some(Box::new(OpenAiGenerator::new(
                key.clone(),
                self.openai_model.clone(),
                self.request_timeout,
            )))
        } else {
            self.ollama_base_url.as_ref().map(|url| {
                Box::new(OllamaGenerator::new(
                    url.clone(),
                    self.ollama_model.clone(),
                    self.request_timeout,
                )) as _
            })
        };

        WordService::new(source, generator, self.fallback_word.clone())
    }
}

/// The word-assignment pipeline: candidate lookup with fallback, refinement,
/// normalization.
pub struct WordService {
    source: Option<Box<dyn WordSource>>,
    generator: Option<Box<dyn WordGenerator>>,
    fallback_word: String,
}

impl WordService {
    pub fn new(
        source: Option<Box<dyn WordSource>>,
        generator: Option<Box<dyn WordGenerator>>,
        fallback_word: String,
    ) -> Self {
        Self {
            source,
            generator,
            fallback_word,
        }
    }

    /// A service with no external providers; always yields the fallback word.
    pub fn offline() -> Self {
        Self::new(None, None, WordConfig::default().fallback_word)
    }

    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    /// Produce the secret word for one round. Candidate failures degrade to
    /// the fallback seed; generator failures propagate so the caller can
    /// revert the round start.
    pub async fn pick_word(&self) -> WordResult<String> {
        let candidate = match &self.source {
            Some(source) => match source.candidate_word().await {
                Ok(word) if !word.trim().is_empty() => word,
                Ok(_) => {
                    tracing::warn!(
                        "word source {} returned an empty word, using fallback",
                        source.name()
                    );
                    self.fallback_word.clone()
                }
                Err(e) => {
                    tracing::warn!("word source {} failed: {}, using fallback", source.name(), e);
                    self.fallback_word.clone()
                }
            },
            None => self.fallback_word.clone(),
        };

        let word = match &self.generator {
            Some(generator) => {
                let correlation_id = ulid::Ulid::new().to_string();
                generator.refine_word(&candidate, &correlation_id).await?
            }
            None => candidate,
        };

        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(WordError::ParseError(
                "generator returned an empty word".to_string(),
            ));
        }
        Ok(word)
    }
}
