//! Fan-in of every source into one visible stream.

use std::{
  pin::Pin,
  task::{Context, Poll},
};

use futures::{Stream, StreamExt, stream::FuturesUnordered};
use gsp_core::{FailurePolicy, Formatter, HomeDir, Order};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  collator::Collator,
  error::{FinderError, Result},
  source::{Emitter, PathSource},
};

/// Everything needed to run one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
  pub sources: Vec<PathSource>,
  pub dedupe: bool,
  pub order: Order,
  pub on_error: FailurePolicy,
}

impl ScanRequest {
  pub fn new(sources: Vec<PathSource>) -> Self {
    Self {
      sources,
      dedupe: false,
      order: Order::Unsorted,
      on_error: FailurePolicy::FailFast,
    }
  }

  pub fn dedupe(mut self, dedupe: bool) -> Self {
    self.dedupe = dedupe;
    self
  }

  pub fn order(mut self, order: Order) -> Self {
    self.order = order;
    self
  }

  pub fn on_error(mut self, on_error: FailurePolicy) -> Self {
    self.on_error = on_error;
    self
  }

  pub fn delivery(&self) -> Delivery {
    let collator = Collator::new(self.dedupe, self.order);
    if collator.is_passthrough() {
      Delivery::Passthrough
    } else {
      Delivery::Collate(collator)
    }
  }
}

/// How merged results reach the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  /// The shared channel is the visible stream; interleaving across sources is unspecified
  Passthrough,
  /// Everything is buffered, then re-emitted deduplicated and/or ordered
  Collate(Collator),
}

/// A source that failed under [`FailurePolicy::BestEffort`]
#[derive(Debug)]
pub struct SourceFailure {
  /// The root as configured
  pub root: String,
  pub error: FinderError,
}

/// Summary of a finished scan.
#[derive(Debug, Default)]
pub struct ScanReport {
  pub sources: usize,
  pub completed: usize,
  /// Paths emitted by the sources, before any deduplication
  pub emitted: usize,
  pub failures: Vec<SourceFailure>,
}

impl ScanReport {
  pub fn is_complete(&self) -> bool {
    self.failures.is_empty() && self.completed == self.sources
  }
}

/// Runs sources concurrently and merges their output.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
  home: Option<HomeDir>,
}

impl Coordinator {
  pub fn new(home: Option<HomeDir>) -> Self {
    Self { home }
  }

  /// Start a scan. Must be called from within a tokio runtime.
  ///
  /// The stream ends once every source has finished (and, when collating,
  /// every buffered item has been re-emitted), or as soon as a fail-fast
  /// error stops the scan. The handle reports how the sources fared.
  pub fn run(&self, request: ScanRequest) -> (ResultStream, ScanHandle) {
    let delivery = request.delivery();
    let ScanRequest {
      sources,
      dedupe,
      order,
      on_error,
    } = request;
    let total = sources.len();
    let capacity = total.max(1);
    let cancel = CancellationToken::new();

    info!(sources = total, dedupe, order = %order, on_error = ?on_error, "Starting scan");

    let (raw_tx, raw_rx) = mpsc::channel(capacity);
    let workers: Vec<(String, JoinHandle<Result<usize>>)> = sources
      .into_iter()
      .map(|source| {
        let root = source.root().to_string();
        let handle = self.spawn_source(source, Emitter::new(raw_tx.clone(), cancel.clone()));
        (root, handle)
      })
      .collect();
    drop(raw_tx);

    let rx = match delivery {
      Delivery::Passthrough => raw_rx,
      Delivery::Collate(collator) => {
        let (out_tx, out_rx) = mpsc::channel(capacity);
        tokio::spawn(collator.run(raw_rx, out_tx, cancel.clone()));
        out_rx
      }
    };

    let supervisor = tokio::spawn(supervise(workers, on_error, cancel.clone()));

    (ResultStream { rx, cancel }, ScanHandle { supervisor })
  }

  fn spawn_source(&self, source: PathSource, emitter: Emitter) -> JoinHandle<Result<usize>> {
    let home = self.home.clone();
    let format = formatter_for(&source, home.as_ref());
    tokio::task::spawn_blocking(move || source.traverse(home.as_ref(), &*format, &emitter))
  }
}

fn formatter_for(source: &PathSource, home: Option<&HomeDir>) -> Formatter {
  match home {
    Some(home) => home.formatter_for(source.root()),
    None => Box::new(|path: &str| path.to_string()),
  }
}

async fn supervise(
  workers: Vec<(String, JoinHandle<Result<usize>>)>,
  policy: FailurePolicy,
  cancel: CancellationToken,
) -> Result<ScanReport> {
  let mut report = ScanReport {
    sources: workers.len(),
    ..Default::default()
  };

  let mut pending: FuturesUnordered<_> = workers
    .into_iter()
    .map(|(root, handle)| async move { (root, handle.await) })
    .collect();

  while let Some((root, joined)) = pending.next().await {
    let outcome = match joined {
      Ok(outcome) => outcome,
      Err(err) if err.is_panic() => Err(FinderError::WorkerPanicked { root: root.clone() }),
      Err(err) => Err(err.into()),
    };

    match outcome {
      Ok(emitted) => {
        debug!(root = %root, emitted, "Source finished");
        report.completed += 1;
        report.emitted += emitted;
      }
      Err(error) => match policy {
        FailurePolicy::FailFast => {
          warn!(root = %root, error = %error, "Source failed, stopping scan");
          cancel.cancel();
          return Err(error);
        }
        FailurePolicy::BestEffort => {
          warn!(root = %root, error = %error, "Source failed, continuing");
          report.failures.push(SourceFailure { root, error });
        }
      },
    }
  }

  info!(
    sources = report.sources,
    completed = report.completed,
    emitted = report.emitted,
    failed = report.failures.len(),
    "Scan finished"
  );
  Ok(report)
}

/// The visible result stream.
///
/// Dropping it closes the channel, which stops the sources (and the collator)
/// at their next send.
#[derive(Debug)]
pub struct ResultStream {
  rx: mpsc::Receiver<String>,
  cancel: CancellationToken,
}

impl ResultStream {
  /// Next result, or `None` once the scan is over
  pub async fn recv(&mut self) -> Option<String> {
    self.next().await
  }
}

impl Stream for ResultStream {
  type Item = String;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    if self.cancel.is_cancelled() {
      return Poll::Ready(None);
    }
    match self.rx.poll_recv(cx) {
      // A fail-fast stop may race with items already in the channel
      Poll::Ready(Some(_)) if self.cancel.is_cancelled() => Poll::Ready(None),
      poll => poll,
    }
  }
}

/// Completion handle for a running scan.
#[derive(Debug)]
pub struct ScanHandle {
  supervisor: JoinHandle<Result<ScanReport>>,
}

impl ScanHandle {
  /// Wait for every source to finish.
  ///
  /// Under fail-fast this is the first source error; under best-effort the
  /// failures are listed in the report.
  pub async fn wait(self) -> Result<ScanReport> {
    self.supervisor.await?
  }
}
