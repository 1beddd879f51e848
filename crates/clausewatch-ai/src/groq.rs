//! Groq chat-completions client (OpenAI-compatible API).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::prompts::PING_PROMPT;
use crate::reasoner::{GenerateRequest, Reasoner, ReasoningError};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            top_p: 0.9,
            max_tokens: 600,
        }
    }
}

impl GroqConfig {
    /// True when an API key is present and non-blank.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's content; empty when the service sent none.
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
    }
}

/// Stateless single-turn client for Groq-hosted models.
pub struct GroqClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    config: GroqConfig,
}

impl GroqClient {
    /// Build a client. Fails with `NotConfigured` when no API key is set.
    pub fn new(config: GroqConfig) -> Result<Self, ReasoningError> {
        let api_key = match &config.api_key {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => return Err(ReasoningError::NotConfigured),
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: chat_endpoint(&config.base_url),
            api_key,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Connection test: one short prompt, reply returned verbatim.
    pub async fn ping(&self) -> Result<String, ReasoningError> {
        self.generate(&GenerateRequest::user(PING_PROMPT)).await
    }

    fn chat_request<'a>(&'a self, request: &'a GenerateRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_prompt,
        });

        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        }
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/openai/v1/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl Reasoner for GroqClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ReasoningError> {
        let body = self.chat_request(request);
        info!(
            model = %self.config.model,
            prompt_len = request.user_prompt.len(),
            "calling groq chat API"
        );

        let resp = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!(timeout_secs = self.config.timeout_secs, "groq request failed: {e}");
                return Err(ReasoningError::Unavailable(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "groq returned non-200");
            return Err(classify_status(status.as_u16(), body));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ReasoningError::Malformed(e.to_string()))?;
        let text = parsed.into_text();
        info!(output_len = text.len(), "groq response received");
        Ok(text)
    }
}

fn classify_status(status: u16, body: String) -> ReasoningError {
    match status {
        429 => ReasoningError::QuotaExceeded,
        502..=504 => ReasoningError::Unavailable(format!("status {status}")),
        _ => ReasoningError::Server { status, body },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GroqConfig {
        GroqConfig {
            api_key: Some("gsk_test".into()),
            ..GroqConfig::default()
        }
    }

    #[test]
    fn missing_key_is_not_configured() {
        assert!(!GroqConfig::default().is_configured());
        assert!(matches!(
            GroqClient::new(GroqConfig::default()),
            Err(ReasoningError::NotConfigured)
        ));
        let blank = GroqConfig {
            api_key: Some("   ".into()),
            ..GroqConfig::default()
        };
        assert!(matches!(GroqClient::new(blank), Err(ReasoningError::NotConfigured)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            chat_endpoint("https://api.groq.com/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        let client = GroqClient::new(GroqConfig {
            base_url: "http://localhost:8080//".into(),
            ..configured()
        })
        .unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/openai/v1/chat/completions");
        assert_eq!(client.model(), "llama-3.1-8b-instant");
    }

    #[test]
    fn request_body_carries_sampling_settings() {
        let client = GroqClient::new(configured()).unwrap();
        let req = GenerateRequest::user("clause text").with_system("system text");
        let json = serde_json::to_value(client.chat_request(&req)).unwrap();

        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["max_tokens"], 600);
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!((json["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "clause text");
    }

    #[test]
    fn user_only_request_has_one_message() {
        let client = GroqClient::new(configured()).unwrap();
        let json = serde_json::to_value(client.chat_request(&GenerateRequest::user("hi"))).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn reply_extraction() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Correct"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.into_text(), "Correct");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.into_text(), "");

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(null.into_text(), "");
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(429, String::new()).is_quota());
        assert!(matches!(
            classify_status(503, String::new()),
            ReasoningError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status(401, "bad key".into()),
            ReasoningError::Server { status: 401, .. }
        ));
    }
}
