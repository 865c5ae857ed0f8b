//! Model-client boundary: turn a prompt string into response text.
//!
//! Providers never return `Err`: a failed call is an [`LlmCall`] with an
//! empty response and a populated `error`, which the flows treat as the
//! hard-failure signal. Both providers speak the OpenAI chat-completions
//! shape; `LocalClient` targets self-hosted servers (Ollama, vLLM) that
//! expose the same API.

use crate::{LlmCall, Options};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::warn;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature used for all annotation calls; the markup grammar
/// degrades quickly at higher temperatures.
const TEMPERATURE: f64 = 0.1;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn query(&self, prompt: &str) -> LlmCall;
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    options: Options,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str, options: Options) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            options,
        })
    }

    /// Point the client at an OpenAI-compatible server other than
    /// api.openai.com.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn query(&self, prompt: &str) -> LlmCall {
        self.options
            .vlog(&format!("... calling OpenAI {} \"{}...\"", self.model, head(prompt)));
        let url = format!("{}/chat/completions", self.base_url);
        let body = chat_body(&self.model, prompt);

        let start = Instant::now();
        let result = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await;
        finish_chat_call(prompt, start, result).await
    }
}

/// Client for a self-hosted OpenAI-compatible endpoint (Ollama, vLLM).
pub struct LocalClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: Options,
}

impl LocalClient {
    pub fn new(base_url: &str, model: &str, options: Options) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options,
        })
    }
}

#[async_trait]
impl LlmClient for LocalClient {
    async fn query(&self, prompt: &str) -> LlmCall {
        self.options
            .vlog(&format!("... calling local model {} \"{}...\"", self.model, head(prompt)));
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = chat_body(&self.model, prompt);

        let start = Instant::now();
        let result = self.client.post(&url).json(&body).send().await;
        finish_chat_call(prompt, start, result).await
    }
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()?)
}

fn chat_body(model: &str, prompt: &str) -> Value {
    serde_json::json!({
        "temperature": TEMPERATURE,
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

/// Common tail of a chat-completions call: parse the payload into an
/// [`LlmCall`], folding every failure into its `error` field.
async fn finish_chat_call(
    prompt: &str,
    start: Instant,
    result: Result<reqwest::Response, reqwest::Error>,
) -> LlmCall {
    let mut response = String::new();
    let mut error = String::new();

    match fetch_payload(result).await {
        Ok(data) => match data["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.is_empty() => response = content.to_string(),
            _ => error = "got empty response".to_string(),
        },
        Err(e) => error = e,
    }
    if !error.is_empty() {
        warn!("model call failed: {error}");
    }

    let duration_secs = (start.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
    LlmCall {
        prompt: prompt.to_string(),
        response,
        duration_secs,
        error,
    }
}

async fn fetch_payload(
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<Value, String> {
    let resp = result.map_err(|e| format!("network error: {e}"))?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(format!("api error ({status}): {text}"));
    }
    let data: Value = resp
        .json()
        .await
        .map_err(|e| format!("invalid response: {e}"))?;
    if data.get("error").is_some() {
        return Err(data["error"].to_string());
    }
    Ok(data)
}

fn head(prompt: &str) -> &str {
    let cut = prompt
        .char_indices()
        .nth(50)
        .map(|(i, _)| i)
        .unwrap_or(prompt.len());
    prompt[..cut].trim()
}
