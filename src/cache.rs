//! In-memory result cache keyed by a normalized (topic, difficulty, language) fingerprint.
//!
//! Eviction is by insertion order only: reads never refresh an entry, and when the
//! cache grows past `max_entries` the oldest-inserted entry goes first. Re-setting a
//! fingerprint counts as a fresh insertion.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::QuestionRecord;
use crate::util::normalize_key;

pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Case- and whitespace-insensitive composite key.
pub fn fingerprint(topic: &str, difficulty: &str, language: &str) -> String {
  [topic, difficulty, language]
    .iter()
    .map(|part| normalize_key(part))
    .collect::<Vec<_>>()
    .join("|")
}

struct CacheEntry {
  questions: Arc<Vec<QuestionRecord>>,
  inserted_at: Instant,
}

#[derive(Default)]
struct CacheState {
  entries: HashMap<String, CacheEntry>,
  // Fingerprints oldest-inserted first; kept in step with `entries`.
  order: VecDeque<String>,
}

impl CacheState {
  fn purge_expired(&mut self, now: Instant, ttl: Duration) {
    while let Some(front) = self.order.front() {
      let expired = self
        .entries
        .get(front)
        .map_or(true, |e| now.saturating_duration_since(e.inserted_at) > ttl);
      if !expired {
        break;
      }
      if let Some(key) = self.order.pop_front() {
        debug!(target: "cache", %key, "Purged expired entry");
        self.entries.remove(&key);
      }
    }
  }
}

pub struct ResultCache {
  state: Mutex<CacheState>,
  ttl: Duration,
  max_entries: usize,
}

impl ResultCache {
  pub fn new(ttl: Duration, max_entries: usize) -> Self {
    Self { state: Mutex::new(CacheState::default()), ttl, max_entries: max_entries.max(1) }
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn get(&self, topic: &str, difficulty: &str, language: &str) -> Option<Arc<Vec<QuestionRecord>>> {
    self.get_at(&fingerprint(topic, difficulty, language), Instant::now()).await
  }

  #[instrument(level = "debug", skip(self, questions), fields(count = questions.len()))]
  pub async fn set(&self, topic: &str, difficulty: &str, language: &str, questions: Vec<QuestionRecord>) {
    self.set_at(fingerprint(topic, difficulty, language), questions, Instant::now()).await
  }

  pub async fn len(&self) -> usize {
    self.state.lock().await.entries.len()
  }

  async fn get_at(&self, key: &str, now: Instant) -> Option<Arc<Vec<QuestionRecord>>> {
    let mut state = self.state.lock().await;
    state.purge_expired(now, self.ttl);
    let hit = state.entries.get(key).map(|e| e.questions.clone());
    debug!(target: "cache", %key, hit = hit.is_some(), "Cache lookup");
    hit
  }

  async fn set_at(&self, key: String, questions: Vec<QuestionRecord>, now: Instant) {
    let mut state = self.state.lock().await;
    state.purge_expired(now, self.ttl);

    if state.entries.contains_key(&key) {
      state.order.retain(|k| k != &key);
    }
    state.order.push_back(key.clone());
    state.entries.insert(key, CacheEntry { questions: Arc::new(questions), inserted_at: now });

    if state.entries.len() > self.max_entries {
      if let Some(oldest) = state.order.pop_front() {
        debug!(target: "cache", key = %oldest, "Evicted oldest-inserted entry");
        state.entries.remove(&oldest);
      }
    }
  }
}

impl Default for ResultCache {
  fn default() -> Self { Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(text: &str) -> QuestionRecord {
    QuestionRecord {
      question: text.into(),
      options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
      answer: "A".into(),
      explanation: "E".into(),
    }
  }

  #[test]
  fn fingerprint_ignores_case_and_whitespace() {
    assert_eq!(fingerprint(" Rust ", "EASY", "English "), fingerprint("rust", "easy", "english"));
    assert_ne!(fingerprint("rust", "easy", "hindi"), fingerprint("rust", "easy", "english"));
  }

  #[tokio::test]
  async fn round_trip_returns_same_questions() {
    let cache = ResultCache::default();
    let set = vec![q("one"), q("two")];
    cache.set("Rust", "easy", "english", set.clone()).await;
    let got = cache.get("  rust", "Easy", "ENGLISH").await.expect("cached");
    assert_eq!(*got, set);
  }

  #[tokio::test]
  async fn entries_expire_after_ttl() {
    let ttl = Duration::from_secs(60);
    let cache = ResultCache::new(ttl, 10);
    let start = Instant::now();
    cache.set_at("k".into(), vec![q("one")], start).await;

    assert!(cache.get_at("k", start + ttl).await.is_some());
    assert!(cache.get_at("k", start + ttl + Duration::from_millis(1)).await.is_none());
    assert_eq!(cache.len().await, 0);
  }

  #[tokio::test]
  async fn evicts_oldest_inserted_not_least_recently_read() {
    let cache = ResultCache::new(DEFAULT_TTL, 2);
    let now = Instant::now();
    cache.set_at("a".into(), vec![q("a")], now).await;
    cache.set_at("b".into(), vec![q("b")], now).await;
    // Reading "a" must not protect it.
    assert!(cache.get_at("a", now).await.is_some());
    cache.set_at("c".into(), vec![q("c")], now).await;

    assert!(cache.get_at("a", now).await.is_none());
    assert!(cache.get_at("b", now).await.is_some());
    assert!(cache.get_at("c", now).await.is_some());
  }

  #[tokio::test]
  async fn overwrite_counts_as_fresh_insertion() {
    let cache = ResultCache::new(DEFAULT_TTL, 2);
    let now = Instant::now();
    cache.set_at("a".into(), vec![q("a1")], now).await;
    cache.set_at("b".into(), vec![q("b")], now).await;
    cache.set_at("a".into(), vec![q("a1"), q("a2")], now).await;
    cache.set_at("c".into(), vec![q("c")], now).await;

    assert!(cache.get_at("b", now).await.is_none());
    assert_eq!(cache.get_at("a", now).await.map(|v| v.len()), Some(2));
    assert_eq!(cache.len().await, 2);
  }
}
