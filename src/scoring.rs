//! Grading of a submitted quiz attempt.

use serde::{Deserialize, Serialize};

/// A question as echoed back by the client; only the fields needed for grading.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmittedQuestion {
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub explanation: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
  Excellent,
  Good,
  Fair,
  NeedsImprovement,
}

impl PerformanceLevel {
  pub fn from_score(score: f64) -> Self {
    if score >= 80.0 {
      PerformanceLevel::Excellent
    } else if score >= 60.0 {
      PerformanceLevel::Good
    } else if score >= 40.0 {
      PerformanceLevel::Fair
    } else {
      PerformanceLevel::NeedsImprovement
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
  pub question_index: usize,
  pub question: String,
  pub user_answer: Option<String>,
  pub correct_answer: String,
  pub is_correct: bool,
  pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
  pub total_questions: usize,
  pub correct_answers: usize,
  /// Percentage with one decimal, e.g. "66.7".
  pub score: String,
  pub performance_level: PerformanceLevel,
  pub results: Vec<QuestionResult>,
}

/// Exact-match grading; a missing answer counts as wrong.
pub fn grade(questions: &[SubmittedQuestion], user_answers: &[Option<String>]) -> Grade {
  let results: Vec<QuestionResult> = questions
    .iter()
    .enumerate()
    .map(|(index, q)| {
      let user_answer = user_answers.get(index).cloned().flatten();
      QuestionResult {
        question_index: index,
        question: q.question.clone(),
        is_correct: user_answer.as_deref() == Some(q.answer.as_str()),
        user_answer,
        correct_answer: q.answer.clone(),
        explanation: q.explanation.clone(),
      }
    })
    .collect();

  let correct_answers = results.iter().filter(|r| r.is_correct).count();
  let score = if questions.is_empty() { 0.0 } else { correct_answers as f64 / questions.len() as f64 * 100.0 };

  Grade {
    total_questions: questions.len(),
    correct_answers,
    score: format!("{:.1}", score),
    performance_level: PerformanceLevel::from_score(score),
    results,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sq(answer: &str) -> SubmittedQuestion {
    SubmittedQuestion { question: format!("Q{}", answer), answer: answer.into(), explanation: "E".into() }
  }

  #[test]
  fn grades_and_formats_score() {
    let qs = vec![sq("A"), sq("B"), sq("C")];
    let answers = vec![Some("A".to_string()), Some("x".to_string())];
    let g = grade(&qs, &answers);
    assert_eq!(g.correct_answers, 1);
    assert_eq!(g.score, "33.3");
    assert_eq!(g.performance_level, PerformanceLevel::NeedsImprovement);
    assert_eq!(g.results[2].user_answer, None);
    assert!(!g.results[2].is_correct);
  }

  #[test]
  fn level_boundaries() {
    assert_eq!(PerformanceLevel::from_score(80.0), PerformanceLevel::Excellent);
    assert_eq!(PerformanceLevel::from_score(79.9), PerformanceLevel::Good);
    assert_eq!(PerformanceLevel::from_score(60.0), PerformanceLevel::Good);
    assert_eq!(PerformanceLevel::from_score(40.0), PerformanceLevel::Fair);
    assert_eq!(PerformanceLevel::from_score(39.9), PerformanceLevel::NeedsImprovement);
  }

  #[test]
  fn empty_quiz_scores_zero() {
    let g = grade(&[], &[]);
    assert_eq!(g.score, "0.0");
    assert_eq!(g.total_questions, 0);
  }

  #[test]
  fn serializes_in_camel_case() {
    let g = grade(&[sq("A")], &[Some("A".into())]);
    let v = serde_json::to_value(&g).unwrap();
    assert_eq!(v["performanceLevel"], "excellent");
    assert_eq!(v["results"][0]["isCorrect"], true);
    assert_eq!(v["results"][0]["correctAnswer"], "A");
  }
}
