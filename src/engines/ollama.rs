use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::engines::Translator;
use crate::errors::EngineError;
use crate::language_utils;
use crate::subtitle_processor::SubtitleEntry;

/// Delay before retry number `attempt` (1-based): `base_ms * 2^(attempt - 1)`, saturating at `u64::MAX`
pub fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    1u64.checked_shl(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Whether to stream the response
    stream: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            stream: false,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Translator backed by an Ollama server, one request per entry
#[derive(Debug, Clone)]
pub struct OllamaTranslator {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model name
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl OllamaTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Translation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            max_retries: config.retry_count,
            backoff_base_ms: 1000,
        })
    }

    /// System prompt for a target language
    pub fn system_prompt(target_language: &str) -> String {
        let language = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());
        format!(
            "You are a professional subtitle translator. Translate the user's text to {}. \
             Reply with the translation only, keep line breaks and do not add commentary.",
            language
        )
    }

    /// Send a generate request, retrying server and network errors with exponential backoff
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, EngineError> {
        let url = format!("{}/api/generate", self.base_url);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<GenerationResponse>().await
                            .map_err(|e| EngineError::InvalidOutput(format!("Failed to parse Ollama response: {}", e)));
                    }

                    let error_text = response.text().await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    if !status.is_server_error() {
                        // Client error - don't retry
                        error!("Ollama API error ({}): {}", status, error_text);
                        return Err(EngineError::Translation(format!("Ollama API error ({}): {}", status, error_text)));
                    }
                    error!("Ollama API error ({}): {} - attempt {}/{}", status, error_text, attempt + 1, self.max_retries + 1);
                    last_error = Some(EngineError::Translation(format!("Ollama API error ({}): {}", status, error_text)));
                }
                Err(e) => {
                    error!("Ollama API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(EngineError::Translation(format!("Failed to send request to Ollama API: {}", e)));
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                tokio::time::sleep(Duration::from_millis(backoff_delay_ms(self.backoff_base_ms, attempt))).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            EngineError::Translation(format!("Ollama API request failed after {} attempts", self.max_retries + 1))
        }))
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate_batch(&self, entries: &[SubtitleEntry], target_language: &str) -> Result<Vec<SubtitleEntry>, EngineError> {
        let system = Self::system_prompt(target_language);
        let mut translated = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.text.trim().is_empty() {
                translated.push(entry.clone());
                continue;
            }

            let request = GenerationRequest::new(&self.model, &entry.text).system(&system);
            let response = self.generate(&request).await?;
            debug!("Translated entry {}", entry.index);

            let mut out = entry.clone();
            out.text = response.response.trim().to_string();
            translated.push(out);
        }

        Ok(translated)
    }
}
