//! Application state: result cache, generator orchestration and configuration.
//!
//! One `AppState` is built at startup and shared with handlers as `Arc<AppState>`.
//! It owns:
//!   - the result cache (fingerprint -> last assembled question set)
//!   - the batch orchestrator around the configured generator, if any
//!   - the engine configuration (batching defaults, prompts)
//!
//! Lookup policy: a cached set that already holds enough questions is served as a
//! prefix; anything shorter is ignored and a full run is made. A run's result only
//! replaces the cached set when it is longer.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::domain::{BatchResult, GenerationRequest, QuestionRecord};
use crate::error::QuizError;
use crate::llm::{GenerationClient, OpenRouterClient};
use crate::orchestrator::BatchOrchestrator;
use crate::stream::StreamPublisher;

pub struct AppState {
  pub cache: ResultCache,
  pub orchestrator: Option<BatchOrchestrator>,
  pub config: EngineConfig,
}

impl AppState {
  /// Build state from config; the generator is enabled only when an API key is present.
  #[instrument(level = "info", skip_all)]
  pub fn new(config: EngineConfig) -> Self {
    let client = OpenRouterClient::from_config(&config);
    if let Some(c) = &client {
      info!(target: "quiz_engine", base_url = %c.base_url, model = %c.model, "Generator enabled.");
    } else {
      warn!(target: "quiz_engine", "Generator disabled (no LLAMA_API_KEY / OPENROUTER_API_KEY). Generation requests will fail.");
    }
    Self::with_client(config, client.map(|c| Arc::new(c) as Arc<dyn GenerationClient>))
  }

  pub fn with_client(config: EngineConfig, client: Option<Arc<dyn GenerationClient>>) -> Self {
    info!(
      target: "quiz_engine",
      ttl_secs = config.cache_ttl.as_secs(),
      max_entries = config.cache_max_entries,
      batch_size = config.default_batch_size,
      max_parallel = config.default_max_parallel,
      "Engine configured"
    );
    Self {
      cache: ResultCache::new(config.cache_ttl, config.cache_max_entries),
      orchestrator: client.map(BatchOrchestrator::new),
      config,
    }
  }

  /// Validate caller input against the configured batching defaults.
  pub fn resolve_request(
    &self,
    topic: &str,
    difficulty: &str,
    language: &str,
    total_count: i64,
    batch_size: Option<usize>,
    max_parallel: Option<usize>,
  ) -> Result<GenerationRequest, QuizError> {
    GenerationRequest::resolve(
      topic,
      difficulty,
      language,
      total_count,
      batch_size,
      max_parallel,
      (self.config.default_batch_size, self.config.default_max_parallel),
    )
  }

  fn orchestrator(&self) -> Result<&BatchOrchestrator, QuizError> {
    self.orchestrator
      .as_ref()
      .ok_or_else(|| QuizError::UpstreamUnavailable("generator API key not configured".into()))
  }

  /// Cache-first generation. May return fewer than requested (even none).
  #[instrument(level = "info", skip(self, req), fields(topic = %req.topic, difficulty = %req.difficulty, language = %req.language, total = req.total_count))]
  pub async fn generate_questions(&self, req: &GenerationRequest) -> Result<Vec<QuestionRecord>, QuizError> {
    let orchestrator = self.orchestrator()?;

    let cached = self.cache.get(&req.topic, req.difficulty.as_str(), req.language.as_str()).await;
    let cached_len = cached.as_ref().map(|c| c.len());
    if let Some(set) = cached.filter(|c| c.len() >= req.total_count) {
      info!(target: "cache", cached = set.len(), "Serving from cache");
      return Ok(set[..req.total_count].to_vec());
    }

    let questions = orchestrator.run(req, None).await;
    self.remember(req, cached_len, &questions).await;
    Ok(questions)
  }

  /// Always generates, pushing each batch to `publisher`; ends with `done` or `error`.
  #[instrument(level = "info", skip(self, req, publisher), fields(topic = %req.topic, total = req.total_count))]
  pub async fn stream_questions(
    &self,
    req: &GenerationRequest,
    publisher: &StreamPublisher,
  ) -> Result<Vec<QuestionRecord>, QuizError> {
    let orchestrator = match self.orchestrator() {
      Ok(o) => o,
      Err(e) => {
        publisher.fail(e.to_string());
        return Err(e);
      }
    };

    let cached_len = self
      .cache
      .get(&req.topic, req.difficulty.as_str(), req.language.as_str())
      .await
      .map(|c| c.len());

    let on_batch = |batch: BatchResult| publisher.publish_batch(batch);
    let questions = orchestrator.run(req, Some(&on_batch)).await;
    self.remember(req, cached_len, &questions).await;
    publisher.complete();
    Ok(questions)
  }

  async fn remember(&self, req: &GenerationRequest, cached_len: Option<usize>, questions: &[QuestionRecord]) {
    if questions.is_empty() {
      return;
    }
    if cached_len.map_or(true, |len| questions.len() > len) {
      self.cache
        .set(&req.topic, req.difficulty.as_str(), req.language.as_str(), questions.to_vec())
        .await;
      let entries = self.cache.len().await;
      info!(target: "cache", stored = questions.len(), entries, "Cached question set");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::orchestrator::tests::{batch_json, request, ScriptedClient};
  use crate::stream::StreamEvent;
  use futures::StreamExt;

  fn state_with(client: Arc<ScriptedClient>) -> AppState {
    AppState::with_client(EngineConfig::default(), Some(client))
  }

  #[tokio::test]
  async fn disabled_generator_is_upstream_unavailable() {
    let state = AppState::with_client(EngineConfig::default(), None);
    let err = state.generate_questions(&request(5, 5, 1)).await.unwrap_err();
    assert!(matches!(err, QuizError::UpstreamUnavailable(_)));
  }

  #[tokio::test]
  async fn second_request_is_served_from_cache() {
    let client = Arc::new(ScriptedClient::new(|call, n| Ok(batch_json(&format!("b{}", call), n))));
    let state = state_with(client.clone());

    let first = state.generate_questions(&request(10, 5, 2)).await.unwrap();
    assert_eq!(client.calls(), 2);

    let mut smaller = request(4, 5, 2);
    smaller.topic = "  RUST ".into();
    let second = state.generate_questions(&smaller).await.unwrap();
    assert_eq!(client.calls(), 2, "cache hit must not call the generator");
    assert_eq!(second, first[..4].to_vec());
  }

  #[tokio::test]
  async fn short_cached_set_is_regenerated_and_replaced() {
    let client = Arc::new(ScriptedClient::new(|call, n| Ok(batch_json(&format!("b{}", call), n))));
    let state = state_with(client.clone());

    state.generate_questions(&request(3, 3, 1)).await.unwrap();
    let bigger = state.generate_questions(&request(6, 3, 1)).await.unwrap();
    assert_eq!(client.calls(), 3);
    assert_eq!(bigger.len(), 6);

    let cached = state.cache.get("rust", "medium", "english").await.unwrap();
    assert_eq!(cached.len(), 6);
  }

  #[tokio::test]
  async fn empty_results_are_not_cached() {
    let client = Arc::new(ScriptedClient::new(|_, _| Ok("nothing useful".into())));
    let state = state_with(client);
    let out = state.generate_questions(&request(5, 5, 1)).await.unwrap();
    assert!(out.is_empty());
    assert_eq!(state.cache.len().await, 0);
  }

  #[tokio::test]
  async fn streaming_publishes_batches_then_done() {
    let client = Arc::new(ScriptedClient::new(|call, n| Ok(batch_json(&format!("b{}", call), n))));
    let state = state_with(client);
    let (publisher, rx) = StreamPublisher::channel();

    let out = state.stream_questions(&request(25, 10, 3), &publisher).await.unwrap();
    drop(publisher);

    let events: Vec<StreamEvent> = rx.collect().await;
    assert_eq!(events.len(), 4);
    assert_eq!(events.last(), Some(&StreamEvent::Done));
    let streamed: usize = events
      .iter()
      .filter_map(|e| match e {
        StreamEvent::Batch { questions, total_batches, .. } => {
          assert_eq!(*total_batches, 3);
          Some(questions.len())
        }
        _ => None,
      })
      .sum();
    assert_eq!(streamed, 25);
    assert_eq!(out.len(), 25);
  }

  #[tokio::test]
  async fn streaming_without_generator_emits_error() {
    let state = AppState::with_client(EngineConfig::default(), None);
    let (publisher, rx) = StreamPublisher::channel();
    assert!(state.stream_questions(&request(5, 5, 1), &publisher).await.is_err());
    drop(publisher);
    let events: Vec<StreamEvent> = rx.collect().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "error");
  }
}
