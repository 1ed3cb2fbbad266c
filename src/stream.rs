//! Incremental delivery of batch results over server-sent events.
//!
//! The publisher writes into an unbounded channel; the HTTP side turns the receiving
//! half into an SSE body. Publishing never waits on the subscriber, and once the
//! subscriber is gone every publish is a no-op, so a run always goes to completion.

use axum::response::sse::Event;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use serde_json::json;
use tracing::debug;

use crate::domain::{BatchResult, QuestionRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
  Batch { index: usize, total_batches: usize, questions: Vec<QuestionRecord> },
  Done,
  Error { error: String },
}

impl StreamEvent {
  pub fn name(&self) -> &'static str {
    match self {
      StreamEvent::Batch { .. } => "batch",
      StreamEvent::Done => "done",
      StreamEvent::Error { .. } => "error",
    }
  }

  pub fn payload(&self) -> serde_json::Value {
    match self {
      StreamEvent::Batch { index, total_batches, questions } => json!({
        "index": index,
        "totalBatches": total_batches,
        "count": questions.len(),
        "questions": questions,
      }),
      StreamEvent::Done => json!({ "message": "complete" }),
      StreamEvent::Error { error } => json!({ "error": error }),
    }
  }

  pub fn to_sse(&self) -> Result<Event, axum::Error> {
    Event::default().event(self.name()).json_data(self.payload())
  }
}

#[derive(Clone)]
pub struct StreamPublisher {
  tx: UnboundedSender<StreamEvent>,
}

impl StreamPublisher {
  pub fn channel() -> (Self, UnboundedReceiver<StreamEvent>) {
    let (tx, rx) = unbounded();
    (Self { tx }, rx)
  }

  pub fn publish_batch(&self, batch: BatchResult) {
    self.send(StreamEvent::Batch {
      index: batch.batch_index,
      total_batches: batch.total_batches,
      questions: batch.questions,
    });
  }

  /// Terminal: `done`, then the channel is closed.
  pub fn complete(&self) {
    self.send(StreamEvent::Done);
    self.tx.close_channel();
  }

  /// Terminal: `error`, then the channel is closed.
  pub fn fail(&self, error: impl Into<String>) {
    self.send(StreamEvent::Error { error: error.into() });
    self.tx.close_channel();
  }

  pub fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }

  fn send(&self, event: StreamEvent) {
    if self.tx.unbounded_send(event).is_err() {
      debug!(target: "generation", "Stream subscriber gone; dropping event");
    }
  }
}
