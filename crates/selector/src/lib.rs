//! Streaming bridge to interactive selectors (fzf, fzy, sk).

mod bridge;
mod command;

use gsp_core::SelectorKind;

pub use bridge::{Result, Selection, Selector};
pub use command::CommandSelector;

/// Create the selector for a configured kind
///
/// Fails with [`SelectorError::NotFound`] when the program is not on `PATH`.
pub fn create_selector(kind: SelectorKind) -> Result<Box<dyn Selector>> {
  Ok(Box::new(CommandSelector::for_kind(kind)?))
}

/// Errors that can occur while running a selector
#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
  #[error("Selector '{program}' not found. Ensure it is in your PATH.")]
  NotFound { program: String },
  #[error("Failed to spawn selector '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
  #[error("Selector {0} was not piped")]
  Pipe(&'static str),
  #[error("Selector failed: {0}")]
  Failed(String),
  #[error("Selector I/O error: {0}")]
  Io(#[from] std::io::Error),
}
