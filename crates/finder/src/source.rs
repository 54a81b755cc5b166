//! A single configured root and its depth-bounded traversal.

use std::{
  io::ErrorKind,
  ops::ControlFlow,
  path::{Path, PathBuf},
};

use gsp_core::HomeDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::{FinderError, Result};

/// One root directory plus the number of levels below it that may be emitted.
///
/// Depth 0 emits the root itself (when it is a directory) and nothing else.
/// Symlinks that resolve to directories are followed and count as one level,
/// like any other subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSource {
  root: String,
  depth: u8,
}

impl PathSource {
  pub fn new(root: impl Into<String>, depth: u8) -> Self {
    Self {
      root: root.into(),
      depth,
    }
  }

  /// The root as configured, before `~` expansion
  pub fn root(&self) -> &str {
    &self.root
  }

  pub fn depth(&self) -> u8 {
    self.depth
  }

  /// Expand `~` and normalise the root.
  ///
  /// Collecting the components drops trailing separators, so `~/projects/`
  /// and `~/projects` count depth from the same directory.
  pub fn resolve(&self, home: Option<&HomeDir>) -> PathBuf {
    let expanded = match home {
      Some(home) => home.expand(&self.root),
      None => self.root.clone(),
    };
    Path::new(&expanded).components().collect()
  }

  /// Walk the source depth-first, pushing every directory through `format`
  /// into `emitter` as soon as it is found.
  ///
  /// Returns the number of emitted paths. Stops early without error when the
  /// emitter reports that nobody is listening anymore.
  pub(crate) fn traverse<F>(&self, home: Option<&HomeDir>, format: &F, emitter: &Emitter) -> Result<usize>
  where
    F: Fn(&str) -> String + ?Sized,
  {
    let root = self.resolve(home);

    let metadata = std::fs::metadata(&root).map_err(|source| FinderError::TraversalFailed {
      path: root.clone(),
      source,
    })?;

    if !metadata.is_dir() {
      if self.depth == 0 {
        debug!(root = %root.display(), "Root is not a directory, nothing to emit");
        return Ok(0);
      }
      return Err(FinderError::NotADirectory { path: root });
    }

    let walker = WalkDir::new(&root)
      .max_depth(usize::from(self.depth))
      .follow_links(true)
      .sort_by_file_name();

    let mut emitted = 0;
    for entry in walker {
      let path = match entry {
        // With follow_links the file type is the link target's
        Ok(entry) if entry.file_type().is_dir() => entry.into_path(),
        Ok(_) => continue,
        Err(err) => match classify(&err) {
          EntryError::Loop => match err.path() {
            Some(path) => path.to_path_buf(),
            None => continue,
          },
          EntryError::Unresolved => continue,
          EntryError::Fatal => {
            let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            return Err(FinderError::TraversalFailed {
              path,
              source: err.into(),
            });
          }
        },
      };

      let item = format(path.to_string_lossy().as_ref());
      if emitter.emit(item).is_break() {
        debug!(root = %root.display(), emitted, "Source stopped early");
        return Ok(emitted);
      }
      emitted += 1;
    }

    trace!(root = %root.display(), emitted, "Source walk complete");
    Ok(emitted)
  }
}

enum EntryError {
  /// A followed link back to one of its ancestors: still a directory, but
  /// not descended into
  Loop,
  /// A link that never reaches a directory, or an entry removed mid-walk
  Unresolved,
  Fatal,
}

fn classify(err: &walkdir::Error) -> EntryError {
  if let Some(ancestor) = err.loop_ancestor() {
    warn!(
      path = ?err.path(),
      ancestor = %ancestor.display(),
      "Symlink loops back to an ancestor, not descending"
    );
    return EntryError::Loop;
  }

  let unresolved = err
    .io_error()
    .is_some_and(|e| matches!(e.kind(), ErrorKind::NotFound | ErrorKind::FilesystemLoop));
  if err.depth() > 0 && unresolved {
    debug!(path = ?err.path(), "Entry does not resolve, skipping");
    return EntryError::Unresolved;
  }

  EntryError::Fatal
}

/// Sending half of the shared result channel, as seen by one source.
///
/// Traversal runs on a blocking thread; `emit` parks that thread until the
/// channel has room, the consumer goes away, or the scan is cancelled.
pub(crate) struct Emitter {
  tx: mpsc::Sender<String>,
  cancel: CancellationToken,
}

impl Emitter {
  pub(crate) fn new(tx: mpsc::Sender<String>, cancel: CancellationToken) -> Self {
    Self { tx, cancel }
  }

  pub(crate) fn emit(&self, item: String) -> ControlFlow<()> {
    if self.cancel.is_cancelled() {
      return ControlFlow::Break(());
    }

    futures::executor::block_on(async {
      tokio::select! {
        biased;
        _ = self.cancel.cancelled() => ControlFlow::Break(()),
        result = self.tx.send(item) => match result {
          Ok(()) => ControlFlow::Continue(()),
          Err(_) => ControlFlow::Break(()),
        },
      }
    })
  }
}
