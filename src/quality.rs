//! Heuristic quality report for a generated question set. Advisory only: issues are
//! logged and folded into a score, never used to reject questions.

use crate::domain::QuestionRecord;

pub const MIN_QUESTION_CHARS: usize = 10;
pub const MAX_QUESTION_CHARS: usize = 200;

pub fn quality_issues(questions: &[QuestionRecord]) -> Vec<String> {
  let mut issues = Vec::new();
  let lowered: Vec<String> = questions.iter().map(|q| q.question.to_lowercase()).collect();

  for (index, q) in questions.iter().enumerate() {
    if lowered.iter().filter(|other| **other == lowered[index]).count() > 1 {
      issues.push(format!("Duplicate question at index {}", index));
    }
    if has_overlapping_options(&q.options) {
      issues.push(format!("Similar options in question {}", index + 1));
    }
    let len = q.question.chars().count();
    if len < MIN_QUESTION_CHARS {
      issues.push(format!("Question {} is too short", index + 1));
    }
    if len > MAX_QUESTION_CHARS {
      issues.push(format!("Question {} is too long", index + 1));
    }
  }
  issues
}

/// One option containing another ("Paris" / "Paris, France") reads as a giveaway.
fn has_overlapping_options(options: &[String]) -> bool {
  let lowered: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();
  lowered.iter().enumerate().any(|(i, a)| {
    lowered.iter().enumerate().any(|(j, b)| i != j && (a.contains(b.as_str()) || b.contains(a.as_str())))
  })
}

pub fn quality_score(issues: &[String]) -> u32 {
  100u32.saturating_sub(10 * issues.len() as u32)
}
