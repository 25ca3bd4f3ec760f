//! Word refinement through a local Ollama instance.

use super::{WordError, WordGenerator, WordResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub struct OllamaGenerator {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn prompt(candidate: &str, correlation_id: &str) -> String {
        format!(
            "Eres un generador de palabras simples y cotidianas para un juego de mesa. \
             Genera una sola palabra concreta, fácil de entender y muy común. \
             Evita palabras raras, técnicas, abstractas o que suenen extrañas. \
             Tu respuesta debe ser solo la palabra, sin comillas ni explicación. \
             Game ID: {correlation_id}. \
             Aquí tienes una palabra aleatoria de la RAE, si crees que es fácil úsala, \
             sino usa un sinónimo: {candidate}"
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl WordGenerator for OllamaGenerator {
    async fn refine_word(&self, candidate: &str, correlation_id: &str) -> WordResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(candidate, correlation_id),
            stream: false,
            // high temperature keeps repeated rounds from converging on the
            // same handful of words
            options: json!({ "temperature": 1.2 }),
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client.post(&url).json(&request).send(),
        )
        .await
        .map_err(|_| WordError::Timeout(self.timeout))?
        .map_err(|e| WordError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WordError::ApiError(format!(
                "ollama returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| WordError::ParseError(e.to_string()))?;

        Ok(body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_candidate_and_id() {
        let prompt = OllamaGenerator::prompt("mesa", "01ARZ3");
        assert!(prompt.contains("mesa"));
        assert!(prompt.contains("Game ID: 01ARZ3"));
    }

    // Requires a local Ollama instance with the model pulled
    #[tokio::test]
    #[ignore]
    async fn test_live_refine() {
        let generator = OllamaGenerator::new(
            "http://localhost:11434".to_string(),
            "llama3.2:3b".to_string(),
            Duration::from_secs(30),
        );
        let word = generator.refine_word("mesa", "test-round").await.unwrap();
        assert!(!word.trim().is_empty());
    }
}
