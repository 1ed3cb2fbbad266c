//! Generator client: one chat-completion call per batch, raw text back.
//!
//! The wire format is OpenAI-compatible chat.completions (OpenRouter by default).
//! Calls are instrumented and log model name, latency and response size, not contents.
//! No retries happen here; a failed call surfaces as `UpstreamUnavailable`.
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{EngineConfig, Prompts};
use crate::domain::{Difficulty, Language};
use crate::error::QuizError;
use crate::util::fill_template;

/// The external question generator, seen as a fallible, slow text source.
#[async_trait]
pub trait GenerationClient: Send + Sync {
  async fn generate(
    &self,
    topic: &str,
    difficulty: Difficulty,
    sub_count: usize,
    language: Language,
  ) -> Result<String, QuizError>;
}

/// Render the per-batch instruction prompt.
pub fn render_prompt(prompts: &Prompts, topic: &str, difficulty: Difficulty, count: usize, language: Language) -> String {
  fill_template(
    &prompts.user_template,
    &[
      ("count", &count.to_string()),
      ("topic", topic),
      ("difficulty", difficulty.as_str()),
      ("difficulty_label", difficulty.label()),
      ("language", language.as_str()),
    ],
  )
}

#[derive(Clone)]
pub struct OpenRouterClient {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub model: String,
  temperature: f32,
  max_tokens: u32,
  prompts: Prompts,
}

impl OpenRouterClient {
  /// Construct the client if an API key is configured; otherwise return None.
  pub fn from_config(cfg: &EngineConfig) -> Option<Self> {
    let api_key = cfg.api_key.clone()?;
    let client = reqwest::Client::builder()
      .timeout(cfg.request_timeout)
      .connect_timeout(Duration::from_secs(10))
      .build()
      .map_err(|e| error!(target: "quiz_engine", error = %e, "Failed to build HTTP client"))
      .ok()?;

    Some(Self {
      client,
      api_key,
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model.clone(),
      temperature: cfg.temperature,
      max_tokens: cfg.max_tokens,
      prompts: cfg.prompts.clone(),
    })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, user), fields(model = %self.model, user_len = user.len()))]
  async fn chat_plain(&self, user: &str) -> Result<String, QuizError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: self.prompts.system.clone() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: self.temperature,
      max_tokens: Some(self.max_tokens),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, concat!("quiz-engine/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| QuizError::UpstreamUnavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(target: "generation", %status, elapsed = ?start.elapsed(), "Generator returned an error status");
      return Err(QuizError::UpstreamUnavailable(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res.json().await
      .map_err(|e| QuizError::UpstreamUnavailable(format!("unreadable response body: {}", e)))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Generator usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .map(|t| t.trim().to_string())
      .unwrap_or_default();
    if text.is_empty() {
      return Err(QuizError::UpstreamUnavailable("empty response from generator".into()));
    }

    info!(elapsed = ?start.elapsed(), response_len = text.len(), "Generator response received");
    Ok(text)
  }
}

#[async_trait]
impl GenerationClient for OpenRouterClient {
  #[instrument(level = "info", skip(self, topic))]
  async fn generate(
    &self,
    topic: &str,
    difficulty: Difficulty,
    sub_count: usize,
    language: Language,
  ) -> Result<String, QuizError> {
    let prompt = render_prompt(&self.prompts, topic, difficulty, sub_count, language);
    self.chat_plain(&prompt).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
