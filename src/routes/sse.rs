//! Server-sent-events endpoint. Validates the query, starts the run in a background
//! task and streams `batch` events as they complete, then `done` (or one `error`).
//!
//! The run is detached from the connection: if the client goes away it still
//! finishes and fills the cache; only publishing stops.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use tracing::{info, instrument, warn};

use crate::domain::GenerationRequest;
use crate::error::QuizError;
use crate::protocol::{StreamQuery, DEFAULT_QUESTION_COUNT};
use crate::state::AppState;
use crate::stream::StreamPublisher;

#[instrument(level = "info", skip(state))]
pub async fn sse_generate_quiz(
  State(state): State<Arc<AppState>>,
  Query(q): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
  let (publisher, rx) = StreamPublisher::channel();

  match resolve_stream_query(&state, &q) {
    Ok(req) => {
      info!(target: "quiz_engine", topic = %req.topic, count = req.total_count, batch_size = req.batch_size, parallel = req.max_parallel, "Streaming quiz generation");
      let state = state.clone();
      tokio::spawn(async move {
        if let Ok(questions) = state.stream_questions(&req, &publisher).await {
          info!(target: "quiz_engine", returned = questions.len(), subscriber_gone = publisher.is_closed(), "Stream run finished");
        }
      });
    }
    Err(e) => {
      warn!(target: "quiz_engine", error = %e, "Rejected stream request");
      publisher.fail(e.to_string());
    }
  }

  Sse::new(rx.map(|event| event.to_sse())).keep_alive(KeepAlive::default())
}

fn resolve_stream_query(state: &AppState, q: &StreamQuery) -> Result<GenerationRequest, QuizError> {
  let total_count = match q.question_count.as_deref().map(str::trim) {
    None | Some("") => DEFAULT_QUESTION_COUNT,
    Some(raw) => raw
      .parse::<i64>()
      .map_err(|_| QuizError::InvalidRequest("Question count must be between 1 and 100".into()))?,
  };
  state.resolve_request(
    q.topic.as_deref().unwrap_or_default(),
    q.difficulty.as_deref().unwrap_or_default(),
    q.language.as_deref().unwrap_or("english"),
    total_count,
    optional_positive(q.batch_size.as_deref(), "batchSize")?,
    optional_positive(q.parallel.as_deref(), "parallel")?,
  )
}

/// Absent or blank means "use the default"; anything else must be a non-negative integer.
fn optional_positive(raw: Option<&str>, name: &str) -> Result<Option<usize>, QuizError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(v) => v
      .parse::<usize>()
      .map(Some)
      .map_err(|_| QuizError::InvalidRequest(format!("{} must be a positive integer", name))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::EngineConfig;

  fn query(pairs: &[(&str, &str)]) -> StreamQuery {
    let mut q = StreamQuery::default();
    for (k, v) in pairs {
      let v = Some(v.to_string());
      match *k {
        "topic" => q.topic = v,
        "difficulty" => q.difficulty = v,
        "questionCount" => q.question_count = v,
        "language" => q.language = v,
        "batchSize" => q.batch_size = v,
        "parallel" => q.parallel = v,
        _ => unreachable!(),
      }
    }
    q
  }

  #[test]
  fn resolves_batching_parameters() {
    let state = AppState::with_client(EngineConfig::default(), None);
    let req = resolve_stream_query(
      &state,
      &query(&[("topic", "Rust"), ("difficulty", "hard"), ("questionCount", "25"), ("batchSize", "10"), ("parallel", "3")]),
    )
    .unwrap();
    assert_eq!((req.total_count, req.batch_size, req.max_parallel), (25, 10, 3));
  }

  #[test]
  fn defaults_apply_when_parameters_are_missing() {
    let state = AppState::with_client(EngineConfig::default(), None);
    let req = resolve_stream_query(&state, &query(&[("topic", "Rust"), ("difficulty", "easy"), ("batchSize", "")])).unwrap();
    assert_eq!((req.total_count, req.batch_size, req.max_parallel), (50, 10, 3));
  }

  #[test]
  fn rejects_non_numeric_parameters() {
    let state = AppState::with_client(EngineConfig::default(), None);
    for bad in [("questionCount", "ten"), ("batchSize", "-1"), ("parallel", "x")] {
      let err = resolve_stream_query(&state, &query(&[("topic", "Rust"), ("difficulty", "easy"), bad])).unwrap_err();
      assert!(matches!(err, QuizError::InvalidRequest(_)));
    }
  }
}
