//! Random-word lookup against the rae-api.com dictionary API.

use super::{WordError, WordResult, WordSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub struct RaeWordSource {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RaeWordSource {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct RaeResponse {
    data: Option<RaeData>,
}

#[derive(Deserialize)]
struct RaeData {
    word: Option<String>,
}

#[async_trait]
impl WordSource for RaeWordSource {
    async fn candidate_word(&self) -> WordResult<String> {
        let url = format!("{}/api/random", self.base_url);

        let response = tokio::time::timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| WordError::Timeout(self.timeout))?
            .map_err(|e| WordError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WordError::ApiError(format!(
                "random word request returned {}",
                response.status()
            )));
        }

        let body: RaeResponse = response
            .json()
            .await
            .map_err(|e| WordError::ParseError(e.to_string()))?;

        body.data
            .and_then(|d| d.word)
            .filter(|w| !w.trim().is_empty())
            .ok_or_else(|| WordError::ParseError("response carried no word".to_string()))
    }

    fn name(&self) -> &str {
        "rae-api"
    }
}
