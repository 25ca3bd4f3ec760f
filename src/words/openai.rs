//! Word refinement through the OpenAI chat API.

use super::{WordError, WordGenerator, WordResult};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;

const SYSTEM_PROMPT: &str =
    "Eres un generador de palabras simples y cotidianas para un juego de mesa. \
     Genera una sola palabra concreta, fácil de entender y muy común. \
     Evita palabras raras, técnicas, abstractas o que suenen extrañas. \
     Tu respuesta debe ser solo la palabra, sin comillas ni explicación.";

pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model,
            timeout,
        }
    }
}

#[async_trait]
impl WordGenerator for OpenAiGenerator {
    async fn refine_word(&self, candidate: &str, correlation_id: &str) -> WordResult<String> {
        let user_content = format!(
            "Game ID: {correlation_id}. \
             Aquí tienes una palabra aleatoria de la RAE, si crees que es fácil úsala, \
             sino usa un sinónimo: {candidate}"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(16u32)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| WordError::ApiError(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_content)
                    .build()
                    .map_err(|e| WordError::ApiError(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| WordError::ApiError(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| WordError::Timeout(self.timeout))?
            .map_err(|e| WordError::ApiError(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| WordError::ParseError("No content in response".to_string()))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_refine() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let generator =
            OpenAiGenerator::new(api_key, "gpt-4o-mini".to_string(), Duration::from_secs(30));

        let word = generator.refine_word("mesa", "test-round").await.unwrap();
        assert!(!word.trim().is_empty());
        println!("Refined word: {}", word);
    }
}
