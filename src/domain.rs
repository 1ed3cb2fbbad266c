//! Domain models: validated questions, request parameters and batch events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

pub const MIN_QUESTION_COUNT: usize = 1;
pub const MAX_QUESTION_COUNT: usize = 100;

/// A structurally valid multiple-choice question.
/// Only `validator::validate` builds these from untrusted generator output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
  pub explanation: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }

  /// Wording used inside generation prompts.
  pub fn label(&self) -> &'static str {
    match self {
      Difficulty::Easy => "basic",
      Difficulty::Medium => "intermediate",
      Difficulty::Hard => "advanced",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Difficulty {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      _ => Err(QuizError::InvalidRequest("Difficulty must be easy, medium, or hard".into())),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
  English,
  Hindi,
  Bengali,
}

impl Language {
  pub fn as_str(&self) -> &'static str {
    match self {
      Language::English => "english",
      Language::Hindi => "hindi",
      Language::Bengali => "bengali",
    }
  }
}

impl Default for Language {
  fn default() -> Self { Language::English }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Language {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "english" => Ok(Language::English),
      "hindi" => Ok(Language::Hindi),
      "bengali" => Ok(Language::Bengali),
      _ => Err(QuizError::InvalidRequest("Language must be english, hindi, or bengali".into())),
    }
  }
}

/// Parameters of one orchestration run. Read-only once resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
  pub topic: String,
  pub difficulty: Difficulty,
  pub language: Language,
  pub total_count: usize,
  pub batch_size: usize,
  pub max_parallel: usize,
}

impl GenerationRequest {
  /// Validate caller input and apply batching defaults.
  ///
  /// `batch_size` is clamped into `[1, total_count]`; `max_parallel` is at least 1.
  pub fn resolve(
    topic: &str,
    difficulty: &str,
    language: &str,
    total_count: i64,
    batch_size: Option<usize>,
    max_parallel: Option<usize>,
    defaults: (usize, usize),
  ) -> Result<Self, QuizError> {
    let topic = topic.trim();
    if topic.is_empty() || difficulty.trim().is_empty() {
      return Err(QuizError::InvalidRequest("Topic and difficulty are required".into()));
    }
    let difficulty = difficulty.parse::<Difficulty>()?;
    let language = language.parse::<Language>()?;
    if total_count < MIN_QUESTION_COUNT as i64 || total_count > MAX_QUESTION_COUNT as i64 {
      return Err(QuizError::InvalidRequest(format!(
        "Question count must be between {} and {}",
        MIN_QUESTION_COUNT, MAX_QUESTION_COUNT
      )));
    }
    let total_count = total_count as usize;
    let (default_batch, default_parallel) = defaults;
    let batch_size = batch_size.unwrap_or(default_batch).clamp(1, total_count);
    let max_parallel = max_parallel.unwrap_or(default_parallel).max(1);

    Ok(Self {
      topic: topic.to_string(),
      difficulty,
      language,
      total_count,
      batch_size,
      max_parallel,
    })
  }
}

/// Emitted to a subscriber as each batch settles. Not persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResult {
  pub batch_index: usize,
  pub total_batches: usize,
  pub questions: Vec<QuestionRecord>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn resolve(count: i64, batch: Option<usize>, parallel: Option<usize>) -> Result<GenerationRequest, QuizError> {
    GenerationRequest::resolve("Rust", "Medium", "ENGLISH", count, batch, parallel, (10, 3))
  }

  #[test]
  fn parses_enums_case_insensitively() {
    assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    assert_eq!("Bengali".parse::<Language>().unwrap(), Language::Bengali);
    assert!("expert".parse::<Difficulty>().is_err());
    assert!("french".parse::<Language>().is_err());
  }

  #[test]
  fn applies_defaults_and_clamps_batch_size() {
    let r = resolve(25, None, None).unwrap();
    assert_eq!((r.batch_size, r.max_parallel), (10, 3));

    let r = resolve(4, Some(10), Some(0)).unwrap();
    assert_eq!((r.batch_size, r.max_parallel), (4, 1));

    let r = resolve(4, Some(0), None).unwrap();
    assert_eq!(r.batch_size, 1);
  }

  #[test]
  fn rejects_out_of_range_counts() {
    assert!(matches!(resolve(0, None, None), Err(QuizError::InvalidRequest(_))));
    assert!(matches!(resolve(101, None, None), Err(QuizError::InvalidRequest(_))));
    assert!(resolve(100, None, None).is_ok());
  }

  #[test]
  fn rejects_blank_topic() {
    let err = GenerationRequest::resolve("   ", "easy", "english", 5, None, None, (10, 3));
    assert!(matches!(err, Err(QuizError::InvalidRequest(_))));
  }
}
