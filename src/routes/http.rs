//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, QuizError};
use crate::protocol::*;
use crate::quality::{quality_issues, quality_score};
use crate::scoring::grade;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { status: "OK", message: "Quiz API is running" })
}

#[instrument(level = "info", skip_all)]
pub async fn http_generate_quiz(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerateQuizIn>, JsonRejection>,
) -> Result<Json<GenerateQuizOut>, ApiError> {
  let Json(body) = body.map_err(|e| QuizError::InvalidRequest(e.body_text()))?;
  let topic = body.topic.unwrap_or_default();
  let req = state.resolve_request(
    &topic,
    body.difficulty.as_deref().unwrap_or_default(),
    body.language.as_deref().unwrap_or("english"),
    body.question_count.unwrap_or(DEFAULT_QUESTION_COUNT),
    None,
    None,
  )?;

  info!(target: "quiz_engine", topic = %req.topic, difficulty = %req.difficulty, language = %req.language, count = req.total_count, "Generating quiz");
  let questions = state.generate_questions(&req).await?;

  let issues = quality_issues(&questions);
  if !issues.is_empty() {
    warn!(target: "quiz_engine", issues = ?issues, "Quality issues detected");
  }
  info!(target: "quiz_engine", requested = req.total_count, returned = questions.len(), "Quiz generated");

  Ok(Json(GenerateQuizOut {
    success: true,
    data: QuizData {
      topic,
      difficulty: req.difficulty,
      question_count: questions.len(),
      quality_score: quality_score(&issues),
      questions,
    },
  }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_submit_quiz(body: Result<Json<SubmitQuizIn>, JsonRejection>) -> Result<Json<SubmitQuizOut>, ApiError> {
  let Json(body) = body.map_err(|e| QuizError::InvalidRequest(e.body_text()))?;
  let (Some(questions), Some(user_answers)) = (body.questions, body.user_answers) else {
    return Err(QuizError::InvalidRequest("Questions and user answers are required".into()).into());
  };

  let grade = grade(&questions, &user_answers);
  info!(target: "quiz_engine", total = grade.total_questions, correct = grade.correct_answers, score = %grade.score, "Quiz graded");

  Ok(Json(SubmitQuizOut {
    success: true,
    data: SubmitQuizData { topic: body.topic, difficulty: body.difficulty, grade },
  }))
}

pub async fn http_not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(json!({ "error": "Endpoint not found" })))
}
