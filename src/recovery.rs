//! Recovery parser for generator output.
//!
//! The generator is a language model, so its "JSON array of questions" may arrive
//! wrapped in markdown fences, as several bare objects back to back, or padded
//! with prose. Each shape is handled by one attempt below; attempts are tried in
//! order and the first that yields records wins.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::QuizError;
use crate::util::trunc_for_log;

type Attempt = fn(&str) -> Option<Vec<Value>>;

const ATTEMPTS: &[(&str, Attempt)] = &[
  ("direct", parse_direct),
  ("concatenated_objects", parse_concatenated_objects),
  ("array_slice", parse_array_slice),
  ("object_slice", parse_object_slice),
];

/// Parse raw generator text into untyped records.
///
/// Fails with `MalformedResponse` (carrying the untouched input) only when no
/// attempt finds a usable JSON structure.
pub fn parse(raw: &str) -> Result<Vec<Value>, QuizError> {
  let content = strip_code_fence(raw);
  for (name, attempt) in ATTEMPTS {
    if let Some(records) = attempt(content) {
      debug!(target: "generation", attempt = %name, records = records.len(), "Recovered generator output");
      return Ok(records);
    }
  }
  warn!(target: "generation", raw = %trunc_for_log(raw, 200), "No recoverable JSON in generator output");
  Err(QuizError::MalformedResponse { raw: raw.to_string() })
}

/// Drop a leading ```` ```lang ```` line and a trailing ```` ``` ```` if present.
fn strip_code_fence(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix("```") {
    s = match rest.find('\n') {
      Some(nl) => &rest[nl + 1..],
      // single-line fence: "```json [...]```"
      None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
  }
  if let Some(rest) = s.strip_suffix("```") {
    s = rest;
  }
  s.trim()
}

/// Arrays are taken as-is; a lone object becomes a one-element sequence.
fn into_records(v: Value) -> Option<Vec<Value>> {
  match v {
    Value::Array(items) => Some(items),
    obj @ Value::Object(_) => Some(vec![obj]),
    _ => None,
  }
}

fn parse_direct(s: &str) -> Option<Vec<Value>> {
  serde_json::from_str::<Value>(s).ok().and_then(into_records)
}

/// `{..}{..}` or `{..}\n{..}` without an enclosing array.
fn parse_concatenated_objects(s: &str) -> Option<Vec<Value>> {
  if s.starts_with('[') {
    return None;
  }
  let joined = join_adjacent_objects(s)?;
  match serde_json::from_str::<Value>(&format!("[{}]", joined)).ok()? {
    Value::Array(items) => Some(items),
    _ => None,
  }
}

/// Insert `,` wherever a `}` is followed (modulo whitespace) by `{`.
/// Returns None when no such boundary exists.
fn join_adjacent_objects(s: &str) -> Option<String> {
  let bytes = s.as_bytes();
  let mut out = String::with_capacity(s.len() + 8);
  let mut found = false;
  let mut last = 0;
  let mut i = 0;
  while i < bytes.len() {
    if bytes[i] == b'}' {
      let mut j = i + 1;
      while j < bytes.len() && bytes[j].is_ascii_whitespace() { j += 1; }
      if j < bytes.len() && bytes[j] == b'{' {
        out.push_str(&s[last..=i]);
        out.push(',');
        last = j;
        found = true;
        i = j;
        continue;
      }
    }
    i += 1;
  }
  if !found {
    return None;
  }
  out.push_str(&s[last..]);
  Some(out)
}

fn parse_array_slice(s: &str) -> Option<Vec<Value>> {
  let start = s.find('[')?;
  let end = s.rfind(']')?;
  if end <= start {
    return None;
  }
  match serde_json::from_str::<Value>(&s[start..=end]).ok()? {
    Value::Array(items) => Some(items),
    _ => None,
  }
}

fn parse_object_slice(s: &str) -> Option<Vec<Value>> {
  let start = s.find('{')?;
  let end = s.rfind('}')?;
  if end <= start {
    return None;
  }
  serde_json::from_str::<Value>(&s[start..=end]).ok().and_then(into_records)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const ONE: &str = r#"[{"question":"Q","options":["A","B","C","D"],"answer":"A","explanation":"E"}]"#;

  #[test]
  fn strips_markdown_fence() {
    let raw = format!("```json\n{}\n```", ONE);
    let records = parse(&raw).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["question"], "Q");
  }

  #[test]
  fn strips_bare_fence_without_language_tag() {
    let raw = format!("```\n{}\n```", ONE);
    assert_eq!(parse(&raw).unwrap().len(), 1);
  }

  #[test]
  fn wraps_single_object() {
    let records = parse(r#"{"question":"Q"}"#).unwrap();
    assert_eq!(records, vec![json!({"question": "Q"})]);
  }

  #[test]
  fn synthesizes_array_from_concatenated_objects() {
    let records = parse(r#"{"q":1}{"q":2}"#).unwrap();
    assert_eq!(records, vec![json!({"q": 1}), json!({"q": 2})]);

    let records = parse("{\"q\":1}\n\n{\"q\":2}\n{\"q\":3}").unwrap();
    assert_eq!(records.len(), 3);
  }

  #[test]
  fn slices_array_out_of_surrounding_prose() {
    let raw = format!("garbage before {} garbage after", ONE);
    let records = parse(&raw).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["answer"], "A");
  }

  #[test]
  fn slices_object_out_of_surrounding_prose() {
    let raw = r#"Here is your question: {"question":"Q","answer":"A"} hope it helps"#;
    let records = parse(raw).unwrap();
    assert_eq!(records, vec![json!({"question": "Q", "answer": "A"})]);
  }

  #[test]
  fn fails_without_json() {
    match parse("no json here") {
      Err(QuizError::MalformedResponse { raw }) => assert_eq!(raw, "no json here"),
      other => panic!("expected MalformedResponse, got {:?}", other),
    }
  }

  #[test]
  fn bare_scalar_is_not_a_record_set() {
    assert!(matches!(parse("42"), Err(QuizError::MalformedResponse { .. })));
  }

  #[test]
  fn unbalanced_brackets_are_malformed() {
    assert!(parse("] nothing [").is_err());
    assert!(parse("[{\"a\": 1").is_err());
  }
}
