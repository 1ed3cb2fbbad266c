//! Public protocol structs for the HTTP and SSE endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, QuestionRecord};
use crate::scoring::{Grade, SubmittedQuestion};

pub const DEFAULT_QUESTION_COUNT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizIn {
  #[serde(default)]
  pub topic: Option<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub question_count: Option<i64>,
  #[serde(default)]
  pub language: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizData {
  pub topic: String,
  pub difficulty: Difficulty,
  pub question_count: usize,
  pub questions: Vec<QuestionRecord>,
  pub quality_score: u32,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizOut {
  pub success: bool,
  pub data: QuizData,
}

/// Query string of the streaming endpoint. Everything arrives as text so that bad
/// values can be reported as an `error` event instead of an HTTP rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamQuery {
  pub topic: Option<String>,
  pub difficulty: Option<String>,
  pub question_count: Option<String>,
  pub language: Option<String>,
  pub batch_size: Option<String>,
  pub parallel: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizIn {
  #[serde(default)]
  pub questions: Option<Vec<SubmittedQuestion>>,
  #[serde(default)]
  pub user_answers: Option<Vec<Option<String>>>,
  #[serde(default)]
  pub topic: Option<String>,
  #[serde(default)]
  pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizData {
  pub topic: Option<String>,
  pub difficulty: Option<String>,
  #[serde(flatten)]
  pub grade: Grade,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizOut {
  pub success: bool,
  pub data: SubmitQuizData,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub status: &'static str,
  pub message: &'static str,
}
