//! Chat completion providers, picked by the configured model name.

use crate::configuration::ChatSettings;
use crate::models::AiModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat completions
    OpenAi,
    /// Any endpoint speaking the OpenAI wire format with a bearer key (grok, deepseek)
    OpenAiCompatible,
    /// Text generation inference endpoints (llama, mixtral)
    Inference,
    /// Anthropic messages API
    Anthropic,
}

impl ProviderKind {
    /// First matching substring wins: gpt, grok, llama/mixtral, claude, deepseek.
    pub fn for_model(name: &str) -> Option<Self> {
        if name.contains("gpt") {
            Some(Self::OpenAi)
        } else if name.contains("grok") {
            Some(Self::OpenAiCompatible)
        } else if name.contains("llama") || name.contains("mixtral") {
            Some(Self::Inference)
        } else if name.contains("claude") {
            Some(Self::Anthropic)
        } else if name.contains("deepseek") {
            Some(Self::OpenAiCompatible)
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("model {0} has no endpoint configured")]
    MissingEndpoint(String),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Answer the conversation with `model`. The model's system message goes first.
    async fn complete(&self, model: &AiModel, messages: &[ChatMessage])
        -> Result<String, LlmError>;
}

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    openai_url: String,
}

impl LlmClient {
    pub fn new(settings: &ChatSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            openai_url: settings.openai_url.clone(),
        }
    }

    fn endpoint(model: &AiModel) -> Result<&str, LlmError> {
        model
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| LlmError::MissingEndpoint(model.name.clone()))
    }

    async fn post(&self, request: reqwest::RequestBuilder, body: Value) -> Result<Value, LlmError> {
        let response = request
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn openai_style(
        &self,
        url: &str,
        model: &AiModel,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let body = json!({
            "model": model.name,
            "messages": with_system(model, messages),
            "max_tokens": model.max_tokens,
        });
        let data = self
            .post(self.http.post(url).bearer_auth(&model.api_key), body)
            .await?;

        data.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .or_else(|| data.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".into()))
    }

    async fn inference(&self, model: &AiModel, messages: &[ChatMessage]) -> Result<String, LlmError> {
        // these endpoints take a single prompt: the latest message
        let inputs = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        let body = json!({
            "inputs": inputs,
            "parameters": { "max_new_tokens": model.max_tokens },
        });
        let data = self
            .post(self.http.post(Self::endpoint(model)?).bearer_auth(&model.api_key), body)
            .await?;

        data.pointer("/0/generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("missing [0].generated_text".into()))
    }

    async fn anthropic(&self, model: &AiModel, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = model
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(ANTHROPIC_API_URL);
        let conversation: Vec<&ChatMessage> =
            messages.iter().filter(|m| m.role != "system").collect();
        let mut body = json!({
            "model": model.name,
            "messages": conversation,
            "max_tokens": model.max_tokens,
        });
        if !model.system_message.is_empty() {
            body["system"] = Value::String(model.system_message.clone());
        }
        let request = self
            .http
            .post(url)
            .header("x-api-key", &model.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let data = self.post(request, body).await?;

        data.pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("missing content[0].text".into()))
    }
}

fn with_system(model: &AiModel, messages: &[ChatMessage]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(model.system_message.clone()))
        .chain(messages.iter().cloned())
        .collect()
}

#[async_trait]
impl ChatCompletion for LlmClient {
    #[tracing::instrument(name = "Chat completion.", skip(self, messages), fields(model = %model.name))]
    async fn complete(
        &self,
        model: &AiModel,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let kind = ProviderKind::for_model(&model.name)
            .ok_or_else(|| LlmError::UnsupportedModel(model.name.clone()))?;
        tracing::debug!("dispatching {} message(s) to {:?}", messages.len(), kind);

        match kind {
            ProviderKind::OpenAi => self.openai_style(&self.openai_url, model, messages).await,
            ProviderKind::OpenAiCompatible => {
                self.openai_style(Self::endpoint(model)?, model, messages).await
            }
            ProviderKind::Inference => self.inference(model, messages).await,
            ProviderKind::Anthropic => self.anthropic(model, messages).await,
        }
    }
}
