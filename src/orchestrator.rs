//! Batch orchestration: split a request into fixed-size batches, run them through
//! a bounded worker pool, merge and de-duplicate.
//!
//! Workers pull batch indices from a shared counter and keep their own results
//! tagged by index, so nothing is shared mutably between them. A batch that fails
//! (network, unparseable output, bad structure) contributes zero questions and
//! never stops its siblings. Callers get whatever survived, possibly fewer than
//! requested.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{BatchResult, GenerationRequest, QuestionRecord};
use crate::error::QuizError;
use crate::llm::GenerationClient;
use crate::util::normalize_key;
use crate::{recovery, validator};

/// Receives each successful batch as soon as it settles, in completion order.
pub type BatchCallback<'a> = &'a (dyn Fn(BatchResult) + Send + Sync);

/// Per-batch sub-counts: every batch is `batch_size` except possibly a smaller last one.
pub fn plan_batches(total_count: usize, batch_size: usize) -> Vec<usize> {
  if total_count == 0 {
    return Vec::new();
  }
  let batch_size = batch_size.max(1);
  let batches = total_count.div_ceil(batch_size);
  (0..batches)
    .map(|i| if i + 1 == batches { total_count - i * batch_size } else { batch_size })
    .collect()
}

/// Flatten per-batch results in batch order, cap at `total_count`, then drop
/// case-insensitive duplicate question texts keeping the first occurrence.
pub fn merge_and_dedup(slots: Vec<Vec<QuestionRecord>>, total_count: usize) -> Vec<QuestionRecord> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for q in slots.into_iter().flatten().take(total_count) {
    if seen.insert(normalize_key(&q.question)) {
      out.push(q);
    }
    if out.len() == total_count {
      break;
    }
  }
  out
}

#[derive(Clone)]
pub struct BatchOrchestrator {
  client: Arc<dyn GenerationClient>,
}

impl BatchOrchestrator {
  pub fn new(client: Arc<dyn GenerationClient>) -> Self {
    Self { client }
  }

  #[instrument(
    level = "info",
    skip(self, req, on_batch),
    fields(run_id = %Uuid::new_v4(), topic = %req.topic, difficulty = %req.difficulty, language = %req.language,
           total = req.total_count, batch_size = req.batch_size, max_parallel = req.max_parallel)
  )]
  pub async fn run(&self, req: &GenerationRequest, on_batch: Option<BatchCallback<'_>>) -> Vec<QuestionRecord> {
    let sizes = plan_batches(req.total_count, req.batch_size);
    let total_batches = sizes.len();
    let next = AtomicUsize::new(0);

    let workers = (0..req.max_parallel.max(1).min(total_batches)).map(|worker| {
      let (next, sizes) = (&next, &sizes);
      async move {
        let mut done = Vec::new();
        loop {
          let index = next.fetch_add(1, Ordering::SeqCst);
          if index >= total_batches {
            break;
          }
          debug!(target: "generation", worker, batch = index + 1, total_batches, size = sizes[index], "Batch started");
          match self.run_batch(req, sizes[index]).await {
            Ok(questions) => {
              info!(target: "generation", batch = index + 1, total_batches, count = questions.len(), "Batch completed");
              if let Some(cb) = on_batch {
                cb(BatchResult { batch_index: index, total_batches, questions: questions.clone() });
              }
              done.push((index, questions));
            }
            Err(e) => {
              warn!(target: "generation", batch = index + 1, total_batches, error = %e, "Batch failed; contributing no questions");
            }
          }
        }
        done
      }
    });

    let mut slots: Vec<Vec<QuestionRecord>> = vec![Vec::new(); total_batches];
    for (index, questions) in join_all(workers).await.into_iter().flatten() {
      slots[index] = questions;
    }

    let merged = merge_and_dedup(slots, req.total_count);
    info!(target: "generation", requested = req.total_count, returned = merged.len(), "Orchestration finished");
    merged
  }

  /// One generator round-trip, recovered and validated.
  async fn run_batch(&self, req: &GenerationRequest, sub_count: usize) -> Result<Vec<QuestionRecord>, QuizError> {
    let raw = self.client.generate(&req.topic, req.difficulty, sub_count, req.language).await?;
    let records = recovery::parse(&raw)?;
    validator::validate(records, &req.topic, req.difficulty)
  }
}
