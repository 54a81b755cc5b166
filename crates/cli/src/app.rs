//! Runs one scan and hands its results to the chosen sink.

use std::{io::ErrorKind, time::Instant};

use anyhow::{Context, Result};
use finder::{Coordinator, PathSource, ScanReport, ScanRequest};
use futures::{Stream, StreamExt};
use gsp_core::{Config, HomeDir};
use selector::{Selection, Selector, create_selector};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// What to do with the scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Hand the results to the interactive selector and print the choice
  Select,
  /// Print every result, one per line
  List,
  /// Print how long the scan took and how many results it produced
  Measure,
}

pub struct App {
  config: Config,
  home: HomeDir,
  mode: Mode,
  selector: Option<Box<dyn Selector>>,
}

impl App {
  /// Validate the config for `mode`. Select mode needs a selector that is
  /// installed; the other modes never start one.
  pub fn new(config: Config, home: HomeDir, mode: Mode) -> Result<Self> {
    let selector = match mode {
      Mode::Select => {
        let kind = config.selector()?;
        Some(create_selector(kind)?)
      }
      Mode::List | Mode::Measure => None,
    };

    Ok(Self {
      config,
      home,
      mode,
      selector,
    })
  }

  /// Select mode with an explicit selector
  pub fn with_selector(config: Config, home: HomeDir, selector: Box<dyn Selector>) -> Self {
    Self {
      config,
      home,
      mode: Mode::Select,
      selector: Some(selector),
    }
  }

  pub fn request(&self) -> ScanRequest {
    let sources = self
      .config
      .sources
      .iter()
      .map(|source| PathSource::new(source.path.clone(), source.depth))
      .collect();

    ScanRequest::new(sources)
      .dedupe(self.config.unique)
      .order(self.config.sort)
      .on_error(self.config.on_error)
  }

  pub async fn run(self) -> Result<()> {
    self.run_with(&mut tokio::io::stdout()).await
  }

  /// Run the scan, writing the program's output to `out`
  pub async fn run_with<W>(self, out: &mut W) -> Result<()>
  where
    W: AsyncWrite + Unpin,
  {
    let request = self.request();
    if request.sources.is_empty() {
      warn!("No sources configured");
    }

    let start = Instant::now();
    let (stream, handle) = Coordinator::new(Some(self.home.clone())).run(request);

    match self.mode {
      Mode::List => {
        let count = list(stream, &mut *out).await.context("Failed to write results")?;
        finish(handle.wait().await?);
        debug!(count, "Listed results");
      }
      Mode::Measure => {
        let count = stream.count().await;
        let elapsed = start.elapsed();
        finish(handle.wait().await?);
        out
          .write_all(format!("Took {elapsed:?} ({count} projects)").as_bytes())
          .await?;
        out.flush().await?;
      }
      Mode::Select => {
        let selector = self.selector.context("No selector available")?;
        debug!(selector = selector.name(), "Starting selector");

        let selection = selector.select(stream.boxed()).await?;
        finish(handle.wait().await?);

        match selection {
          Selection::Chosen(chosen) => {
            let output = render_selection(&chosen, self.config.expand_output, &self.home);
            out.write_all(output.as_bytes()).await?;
            out.flush().await?;
          }
          Selection::Cancelled => debug!("Selection cancelled"),
        }
      }
    }

    Ok(())
  }
}

fn finish(report: ScanReport) {
  for failure in &report.failures {
    warn!(root = %failure.root, error = %failure.error, "Source skipped");
  }
  debug!(
    sources = report.sources,
    completed = report.completed,
    emitted = report.emitted,
    "Scan complete"
  );
}

/// Write each item on its own line.
///
/// A closed stdout (`gsp -l | head`) ends the listing without error.
async fn list<S, W>(mut stream: S, out: W) -> std::io::Result<usize>
where
  S: Stream<Item = String> + Unpin,
  W: AsyncWrite + Unpin,
{
  let mut out = BufWriter::new(out);
  let mut count = 0;

  while let Some(item) = stream.next().await {
    let written = async {
      out.write_all(item.as_bytes()).await?;
      out.write_all(b"\n").await
    };
    match written.await {
      Ok(()) => count += 1,
      Err(err) if err.kind() == ErrorKind::BrokenPipe => return Ok(count),
      Err(err) => return Err(err),
    }
  }

  match out.flush().await {
    Err(err) if err.kind() != ErrorKind::BrokenPipe => Err(err),
    _ => Ok(count),
  }
}

/// The final line printed for a selection, without trailing newline
fn render_selection(chosen: &str, expand: bool, home: &HomeDir) -> String {
  if expand {
    home.expand_output(chosen)
  } else {
    chosen.to_string()
  }
}
