//! Async HTTP client for the remote AI architect
//!
//! Model-agnostic chat client speaking both the Anthropic and
//! OpenAI-compatible wire formats, selected by URL sniffing. This layer only
//! moves requests and extracts response text; prompts, JSON validation, the
//! timeout race, and the fallback policy all live in the provider above it.

use crate::core::error::{ChaosError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Wire format spoken by the remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAi,
}

impl ApiFormat {
    /// Sniff the format from the endpoint URL. Anything that is not the
    /// Anthropic API speaks the OpenAI-compatible format (OpenAI, DeepSeek,
    /// most local servers).
    fn sniff(url: &str) -> Self {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAi
        }
    }
}

/// Chat completion client for the architect and news personas
pub struct LlmClient {
    http: Client,
    api_key: String,
    api_url: String,
    model: String,
    format: ApiFormat,
    /// City layouts run a few hundred blocks of JSON; news tickers are one
    /// line. 4096 covers both with headroom.
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let format = ApiFormat::sniff(&api_url);
        Self {
            http: Client::new(),
            api_key,
            api_url,
            model,
            format,
            max_tokens: 4096,
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL (defaults to claude-3-haiku-20240307)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ChaosError::Provider("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());

        Ok(Self::new(api_key, api_url, model))
    }

    /// Send a completion request and return the response text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = match self.format {
            ApiFormat::Anthropic => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "system": system,
                "messages": [{"role": "user", "content": user}],
            }),
            ApiFormat::OpenAi => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [
                    {"role": "system", "content": system},
                    {"role": "user", "content": user},
                ],
            }),
        };

        let request = self
            .http
            .post(&self.api_url)
            .header("content-type", "application/json")
            .json(&body);
        let request = match self.format {
            ApiFormat::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
            ApiFormat::OpenAi => request.header("Authorization", format!("Bearer {}", self.api_key)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ChaosError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            // Status code stays in the message: the provider classifies
            // quota failures (429) from it.
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ChaosError::Provider(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let text = match self.format {
            ApiFormat::Anthropic => {
                let reply: AnthropicReply = response
                    .json()
                    .await
                    .map_err(|e| ChaosError::Provider(e.to_string()))?;
                reply.content.into_iter().next().map(|c| c.text)
            }
            ApiFormat::OpenAi => {
                let reply: OpenAiReply = response
                    .json()
                    .await
                    .map_err(|e| ChaosError::Provider(e.to_string()))?;
                reply.choices.into_iter().next().map(|c| c.message.content)
            }
        };

        text.ok_or_else(|| ChaosError::Provider("empty response".into()))
    }
}

#[derive(Deserialize)]
struct AnthropicReply {
    content: Vec<AnthropicChunk>,
}

#[derive(Deserialize)]
struct AnthropicChunk {
    text: String,
}

#[derive(Deserialize)]
struct OpenAiReply {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sniffing() {
        assert_eq!(
            ApiFormat::sniff("https://api.anthropic.com/v1/messages"),
            ApiFormat::Anthropic
        );
        assert_eq!(
            ApiFormat::sniff("https://api.deepseek.com/chat/completions"),
            ApiFormat::OpenAi
        );
        assert_eq!(
            ApiFormat::sniff("http://127.0.0.1:8080/v1/chat/completions"),
            ApiFormat::OpenAi
        );
    }

    #[test]
    fn test_from_env_missing_key() {
        if std::env::var("LLM_API_KEY").is_err() {
            assert!(LlmClient::from_env().is_err());
        }
    }
}
