//! Buffering stage: deduplicate and/or order the merged stream.
//!
//! Nothing reaches the consumer until every source has finished. That is the
//! price of a complete dedupe and a total order.

use std::collections::HashSet;

use gsp_core::Order;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Dedupe and ordering settings for a buffered scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collator {
  dedupe: bool,
  order: Order,
}

impl Collator {
  pub fn new(dedupe: bool, order: Order) -> Self {
    Self { dedupe, order }
  }

  /// True when the collator would leave the stream untouched
  pub fn is_passthrough(&self) -> bool {
    !self.dedupe && self.order == Order::Unsorted
  }

  /// Collate a complete set of items.
  ///
  /// The first occurrence of each string is kept. Sorting is byte-wise and
  /// happens after deduplication.
  pub fn collate(&self, items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut buffer = Buffer::new(*self);
    for item in items {
      buffer.push(item);
    }
    buffer.finish()
  }

  /// Drain `raw` to completion, then re-emit the collated items on `out`.
  ///
  /// Gives up early when the consumer drops `out` or the scan is cancelled;
  /// dropping `raw` then lets the sources exit.
  pub(crate) async fn run(self, mut raw: mpsc::Receiver<String>, out: mpsc::Sender<String>, cancel: CancellationToken) {
    let mut buffer = Buffer::new(self);

    loop {
      tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          debug!(buffered = buffer.len(), "Collator cancelled while draining");
          return;
        }
        _ = out.closed() => {
          debug!(buffered = buffer.len(), "Collator: downstream closed while draining");
          return;
        }
        item = raw.recv() => match item {
          Some(item) => buffer.push(item),
          None => break,
        },
      }
    }
    drop(raw);

    let results = buffer.finish();
    let total = results.len();
    debug!(total, dedupe = self.dedupe, order = %self.order, "Collator re-emitting");

    for (i, item) in results.into_iter().enumerate() {
      tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          debug!(emitted = i, total, "Collator cancelled while emitting");
          return;
        }
        result = out.send(item) => {
          if result.is_err() {
            debug!(emitted = i, total, "Collator: downstream closed");
            return;
          }
        }
      }
    }
  }
}

/// Insertion-ordered buffer with an optional membership set.
struct Buffer {
  collator: Collator,
  seen: HashSet<String>,
  items: Vec<String>,
}

impl Buffer {
  fn new(collator: Collator) -> Self {
    Self {
      collator,
      seen: HashSet::new(),
      items: Vec::with_capacity(64),
    }
  }

  fn len(&self) -> usize {
    self.items.len()
  }

  fn push(&mut self, item: String) {
    if self.collator.dedupe && !self.seen.insert(item.clone()) {
      return;
    }
    self.items.push(item);
  }

  fn finish(self) -> Vec<String> {
    let mut items = self.items;
    match self.collator.order {
      Order::Ascending => items.sort_unstable(),
      Order::Descending => items.sort_unstable_by(|a, b| b.cmp(a)),
      Order::Unsorted => {}
    }
    items
  }
}
