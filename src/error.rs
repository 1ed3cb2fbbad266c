//! Error taxonomy for quiz generation, plus the HTTP mapping used by handlers.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum QuizError {
  /// Every recovery attempt on the generator output failed. `raw` is kept for diagnostics.
  #[error("Invalid JSON format from generator: {}", trunc_for_log(.raw, 120))]
  MalformedResponse { raw: String },

  #[error("Invalid question structure: {0}")]
  InvalidQuestionStructure(String),

  #[error("Generator unavailable: {0}")]
  UpstreamUnavailable(String),

  #[error("{0}")]
  InvalidRequest(String),
}

/// Boundary wrapper so handlers can `?` a `QuizError` into a JSON response.
#[derive(Debug)]
pub struct ApiError(pub QuizError);

impl From<QuizError> for ApiError {
  fn from(e: QuizError) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self.0 {
      QuizError::InvalidRequest(msg) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
      }
      other => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
          "error": "Failed to generate quiz questions",
          "message": other.to_string(),
        })),
      )
        .into_response(),
    }
  }
}
