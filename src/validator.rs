//! Structural validation of recovered records into `QuestionRecord`s.
//!
//! Strict by batch: the first bad record rejects the whole set.

use serde_json::Value;

use crate::domain::{Difficulty, QuestionRecord};
use crate::error::QuizError;

pub const OPTION_COUNT: usize = 4;

/// Validate and normalize a batch of untyped records.
pub fn validate(records: Vec<Value>, topic: &str, difficulty: Difficulty) -> Result<Vec<QuestionRecord>, QuizError> {
  records
    .iter()
    .enumerate()
    .map(|(index, record)| validate_one(index, record, topic, difficulty))
    .collect()
}

fn validate_one(index: usize, record: &Value, topic: &str, difficulty: Difficulty) -> Result<QuestionRecord, QuizError> {
  let invalid = |why: &str| QuizError::InvalidQuestionStructure(format!("question {}: {}", index + 1, why));

  let question = field_text(record, "question")
    .filter(|q| !q.is_empty())
    .ok_or_else(|| invalid("missing question text"))?;

  let raw_options = record
    .get("options")
    .and_then(Value::as_array)
    .ok_or_else(|| invalid("options must be an array"))?;
  if raw_options.len() != OPTION_COUNT {
    return Err(invalid(&format!("must have exactly {} options, got {}", OPTION_COUNT, raw_options.len())));
  }
  let mut options = Vec::with_capacity(OPTION_COUNT);
  for opt in raw_options {
    let text = value_text(opt)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| invalid("options must be non-empty strings"))?;
    if options.contains(&text) {
      return Err(invalid(&format!("duplicate option '{}'", text)));
    }
    options.push(text);
  }

  let answer = field_text(record, "answer")
    .filter(|a| !a.is_empty())
    .ok_or_else(|| invalid("missing answer"))?;
  if !options.contains(&answer) {
    return Err(invalid("answer must be one of the options"));
  }

  let explanation = field_text(record, "explanation")
    .filter(|e| !e.is_empty())
    .unwrap_or_else(|| fallback_explanation(topic, difficulty));

  Ok(QuestionRecord { question, options, answer, explanation })
}

fn field_text(record: &Value, key: &str) -> Option<String> {
  record.get(key).and_then(value_text)
}

/// Generators sometimes emit numeric options ("4" vs 4); both are accepted as text.
fn value_text(v: &Value) -> Option<String> {
  match v {
    Value::String(s) => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

pub fn fallback_explanation(topic: &str, difficulty: Difficulty) -> String {
  format!("This is the correct answer for this {} level question about {}.", difficulty, topic)
}
