//! External selector process driven over stdin/stdout.

use std::{io::ErrorKind, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use gsp_core::SelectorKind;
use tokio::{io::AsyncWriteExt, process::ChildStdin, process::Command};
use tracing::{debug, error, trace};

use crate::{Result, Selection, Selector, SelectorError};

/// Runs a selector program, feeding candidates on stdin and reading the
/// chosen line from stdout. Anything on stderr counts as failure.
#[derive(Debug, Clone)]
pub struct CommandSelector {
  program: PathBuf,
  name: String,
  args: Vec<String>,
}

impl CommandSelector {
  /// Resolve the program for `kind` on `PATH`
  pub fn for_kind(kind: SelectorKind) -> Result<Self> {
    let program = which::which(kind.program()).map_err(|err| {
      debug!(program = kind.program(), err = %err, "Selector not found on PATH");
      SelectorError::NotFound {
        program: kind.program().to_string(),
      }
    })?;
    trace!(program = %program.display(), "Found selector executable");
    Ok(Self::new(program))
  }

  pub fn new(program: impl Into<PathBuf>) -> Self {
    let program = program.into();
    let name = program
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| program.to_string_lossy().into_owned());
    Self {
      program,
      name,
      args: Vec::new(),
    }
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

#[async_trait]
impl Selector for CommandSelector {
  fn name(&self) -> &str {
    &self.name
  }

  async fn select(&self, input: BoxStream<'static, String>) -> Result<Selection> {
    let mut cmd = Command::new(&self.program);
    cmd
      .args(&self.args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    trace!(program = %self.program.display(), args = ?self.args, "Spawning selector");

    let mut child = cmd.spawn().map_err(|source| {
      error!(program = %self.program.display(), err = %source, "Failed to spawn selector");
      SelectorError::Spawn {
        program: self.name.clone(),
        source,
      }
    })?;

    let stdin = child.stdin.take().ok_or(SelectorError::Pipe("stdin"))?;
    let pump = tokio::spawn(feed(stdin, input));

    let output = child.wait_with_output().await?;

    // The process is gone; stop feeding and release the input stream
    pump.abort();
    let fed = match pump.await {
      Ok(fed) => Some(fed),
      Err(err) if err.is_cancelled() => None,
      Err(err) => return Err(SelectorError::Failed(format!("input pump panicked: {err}"))),
    };

    debug!(
      selector = %self.name,
      status = ?output.status.code(),
      stdout_len = output.stdout.len(),
      stderr_len = output.stderr.len(),
      "Selector exited"
    );

    if !output.stderr.is_empty() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(SelectorError::Failed(stderr.trim().to_string()));
    }

    if let Some(fed) = fed {
      let lines = fed?;
      trace!(lines, "Input pump finished");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let chosen = stdout.trim_end_matches(['\n', '\r']);
    if chosen.is_empty() {
      Ok(Selection::Cancelled)
    } else {
      Ok(Selection::Chosen(chosen.to_string()))
    }
  }
}

/// Write every item plus `\n` to the selector, closing stdin at end of input.
///
/// A selector that exits before reading everything closes its end of the
/// pipe; that is reported as a normal stop.
async fn feed(mut stdin: ChildStdin, mut input: BoxStream<'static, String>) -> std::io::Result<usize> {
  let mut fed = 0;
  let mut line = String::new();

  while let Some(item) = input.next().await {
    line.clear();
    line.push_str(&item);
    line.push('\n');

    match stdin.write_all(line.as_bytes()).await {
      Ok(()) => fed += 1,
      Err(err) if err.kind() == ErrorKind::BrokenPipe => {
        debug!(fed, "Selector closed its input early");
        return Ok(fed);
      }
      Err(err) => return Err(err),
    }
  }

  Ok(fed)
}
